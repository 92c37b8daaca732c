/// Square input expected by the RF-DETR exports used in production.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (512, 512);

/// Grey fill used for the letterbox padding.
pub const LETTERBOX_COLOR: u8 = 114;
