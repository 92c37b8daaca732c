use crate::config::{DEFAULT_INPUT_SIZE, LETTERBOX_COLOR};
use crate::{Preprocess, PreprocessResult};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Placement of the resized image inside the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    scale: f32,
    width: u32,
    height: u32,
    offset_x: u32,
    offset_y: u32,
}

impl Placement {
    fn fit(source: (u32, u32), target: (u32, u32)) -> Self {
        let scale = (target.0 as f32 / source.0 as f32).min(target.1 as f32 / source.1 as f32);
        // Extreme aspect ratios can round one side to zero.
        let width = ((source.0 as f32 * scale) as u32).clamp(1, target.0);
        let height = ((source.1 as f32 * scale) as u32).clamp(1, target.1);

        Self {
            scale,
            width,
            height,
            offset_x: (target.0 - width) / 2,
            offset_y: (target.1 - height) / 2,
        }
    }
}

pub struct CpuPreProcessor {
    pub input_size: (u32, u32),
    letterboxed_buffer: Vec<u8>,
}

impl CpuPreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            letterboxed_buffer: vec![LETTERBOX_COLOR; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    /// Letterbox and normalise a packed RGB buffer.
    ///
    /// Returns the NCHW tensor together with `(scale, offset_x, offset_y)`,
    /// which post-processing needs to map boxes back to the source image.
    pub fn preprocess_from_u8_slice(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<(Array<f32, IxDyn>, f32, f32, f32)> {
        let _s = span!("preprocess_frame");

        tracing::trace!(
            width,
            height,
            pixel_bytes = pixels.len(),
            "Preprocessing frame dimensions"
        );

        if width == 0 || height == 0 {
            anyhow::bail!("Cannot preprocess an empty {}x{} image", width, height);
        }
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            anyhow::bail!(
                "Model input size must be non-zero, got {}x{}",
                self.input_size.0,
                self.input_size.1
            );
        }

        let expected_size = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                expected_size,
                pixels.len()
            );
        }

        let placement = self.resize_and_letterbox(pixels, width, height)?;
        let input = self.normalize()?;

        Ok((
            input,
            placement.scale,
            placement.offset_x as f32,
            placement.offset_y as f32,
        ))
    }

    fn resize_and_letterbox(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<Placement> {
        let _s = span!("resize_and_letterbox");

        let placement = Placement::fit((width, height), self.input_size);

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
        let mut resized = Image::new(placement.width, placement.height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let row_bytes = (placement.width * 3) as usize;
        let stride = (self.input_size.0 * 3) as usize;

        for (y, src_row) in resized_data.chunks_exact(row_bytes).enumerate() {
            let dst_row =
                (y + placement.offset_y as usize) * stride + (placement.offset_x * 3) as usize;
            self.letterboxed_buffer[dst_row..dst_row + row_bytes].copy_from_slice(src_row);
        }

        Ok(placement)
    }

    fn normalize(&self) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("normalize");

        let width = self.input_size.0 as usize;
        let height = self.input_size.1 as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in self.letterboxed_buffer.chunks_exact(3).enumerate() {
            for c in 0..3 {
                let value = px[c] as f32 / 255.0;
                output[i + c * spatial] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, 3, height, width]),
            output,
        )?)
    }
}

impl Default for CpuPreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

impl Preprocess for CpuPreProcessor {
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult> {
        let (data, scale, offset_x, offset_y) =
            self.preprocess_from_u8_slice(pixels, width, height)?;
        Ok(PreprocessResult {
            data,
            scale,
            offset_x,
            offset_y,
        })
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }
}
