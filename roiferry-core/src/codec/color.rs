// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

/// Pack RGBA channels into a signed 32-bit color
///
/// Channels are packed as `red << 24 | green << 16 | blue << 8 | alpha`.
/// Packed values above `i32::MAX` wrap around to negative numbers since
/// OMERO stores colors in a signed 32-bit field. Channels are not range
/// checked and values above 255 spill into the neighbouring channel.
///
/// # Arguments
///
/// * `red` - Red channel in [0, 255]
/// * `green` - Green channel in [0, 255]
/// * `blue` - Blue channel in [0, 255]
/// * `alpha` - Alpha channel in [0, 255]
///
/// # Examples
///
/// ```
/// use roiferry_core::codec::rgba_to_int;
///
/// assert_eq!(rgba_to_int(0, 0, 0, 255), 255);
/// assert_eq!(rgba_to_int(255, 255, 255, 255), -1);
/// ```
pub const fn rgba_to_int(red: u32, green: u32, blue: u32, alpha: u32) -> i32 {
    let packed: i64 =
        ((red as i64) << 24) + ((green as i64) << 16) + ((blue as i64) << 8) + alpha as i64;

    if packed > i32::MAX as i64 {
        (packed - (1i64 << 32)) as i32
    } else {
        packed as i32
    }
}

/// Pack an opaque RGB color into a signed 32-bit color
pub const fn rgba(red: u32, green: u32, blue: u32) -> i32 {
    rgba_to_int(red, green, blue, 255)
}

/// Unpack a signed 32-bit color into [red, green, blue, alpha]
pub fn int_to_rgba(color: i32) -> [u8; 4] {
    (color as u32).to_be_bytes()
}
