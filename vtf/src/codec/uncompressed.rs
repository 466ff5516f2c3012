//! Per-pixel formats. Channel names follow byte order in memory; packed
//! 16-bit formats are little-endian words.

use half::f16;

use super::color::{expand, luminance8, quantize};
use crate::vtf::consts::ImageFormat;

const BLUESCREEN: [u8; 3] = [0, 0, 255];

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn u8_to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

fn word(p: &[u8]) -> u16 {
    u16::from_le_bytes([p[0], p[1]])
}

fn float(p: &[u8]) -> f32 {
    f32::from_le_bytes([p[0], p[1], p[2], p[3]])
}

/// Decode one pixel. `p` holds exactly the format's bytes per pixel.
pub fn decode_pixel(format: ImageFormat, p: &[u8]) -> [u8; 4] {
    match format {
        ImageFormat::RGBA8888 | ImageFormat::UVWQ8888 | ImageFormat::UVLX8888 => {
            [p[0], p[1], p[2], p[3]]
        }
        ImageFormat::ABGR8888 => [p[3], p[2], p[1], p[0]],
        ImageFormat::ARGB8888 => [p[1], p[2], p[3], p[0]],
        ImageFormat::BGRA8888 => [p[2], p[1], p[0], p[3]],
        ImageFormat::BGRX8888 => [p[2], p[1], p[0], 255],
        ImageFormat::RGB888 => [p[0], p[1], p[2], 255],
        ImageFormat::BGR888 => [p[2], p[1], p[0], 255],
        ImageFormat::RGB888_BLUESCREEN => {
            if p[..3] == BLUESCREEN {
                [0, 0, 0, 0]
            } else {
                [p[0], p[1], p[2], 255]
            }
        }
        ImageFormat::BGR888_BLUESCREEN => {
            if [p[2], p[1], p[0]] == BLUESCREEN {
                [0, 0, 0, 0]
            } else {
                [p[2], p[1], p[0], 255]
            }
        }
        ImageFormat::I8 => [p[0], p[0], p[0], 255],
        ImageFormat::IA88 => [p[0], p[0], p[0], p[1]],
        ImageFormat::A8 => [0, 0, 0, p[0]],
        ImageFormat::UV88 => [p[0], p[1], 0, 255],
        ImageFormat::BGR565 => {
            let w = word(p);
            [expand(w >> 11, 5), expand(w >> 5, 6), expand(w, 5), 255]
        }
        ImageFormat::RGB565 => {
            let w = word(p);
            [expand(w, 5), expand(w >> 5, 6), expand(w >> 11, 5), 255]
        }
        ImageFormat::BGRA5551 => {
            let w = word(p);
            [
                expand(w >> 10, 5),
                expand(w >> 5, 5),
                expand(w, 5),
                expand(w >> 15, 1),
            ]
        }
        ImageFormat::BGRX5551 => {
            let w = word(p);
            [expand(w >> 10, 5), expand(w >> 5, 5), expand(w, 5), 255]
        }
        ImageFormat::BGRA4444 => {
            let w = word(p);
            [
                expand(w >> 8, 4),
                expand(w >> 4, 4),
                expand(w, 4),
                expand(w >> 12, 4),
            ]
        }
        ImageFormat::RGBA16161616 => [p[1], p[3], p[5], p[7]],
        ImageFormat::RGBA16161616F => {
            let c = |i: usize| unit_to_u8(f16::from_le_bytes([p[i], p[i + 1]]).to_f32());
            [c(0), c(2), c(4), c(6)]
        }
        ImageFormat::RGBA32323232F => {
            let c = |i: usize| unit_to_u8(float(&p[i..]));
            [c(0), c(4), c(8), c(12)]
        }
        ImageFormat::RGB323232F => {
            let c = |i: usize| unit_to_u8(float(&p[i..]));
            [c(0), c(4), c(8), 255]
        }
        _ => unreachable!("{format} is not a per-pixel format"),
    }
}

/// Append the encoding of one RGBA pixel.
pub fn encode_pixel(format: ImageFormat, px: [u8; 4], out: &mut Vec<u8>) {
    let [r, g, b, a] = px;
    match format {
        ImageFormat::RGBA8888 | ImageFormat::UVWQ8888 | ImageFormat::UVLX8888 => {
            out.extend_from_slice(&px)
        }
        ImageFormat::ABGR8888 => out.extend_from_slice(&[a, b, g, r]),
        ImageFormat::ARGB8888 => out.extend_from_slice(&[a, r, g, b]),
        ImageFormat::BGRA8888 => out.extend_from_slice(&[b, g, r, a]),
        ImageFormat::BGRX8888 => out.extend_from_slice(&[b, g, r, 255]),
        ImageFormat::RGB888 => out.extend_from_slice(&[r, g, b]),
        ImageFormat::BGR888 => out.extend_from_slice(&[b, g, r]),
        ImageFormat::RGB888_BLUESCREEN => {
            if a < 128 {
                out.extend_from_slice(&BLUESCREEN)
            } else {
                out.extend_from_slice(&[r, g, b])
            }
        }
        ImageFormat::BGR888_BLUESCREEN => {
            if a < 128 {
                out.extend_from_slice(&[BLUESCREEN[2], BLUESCREEN[1], BLUESCREEN[0]])
            } else {
                out.extend_from_slice(&[b, g, r])
            }
        }
        ImageFormat::I8 => out.push(luminance8(&px)),
        ImageFormat::IA88 => out.extend_from_slice(&[luminance8(&px), a]),
        ImageFormat::A8 => out.push(a),
        ImageFormat::UV88 => out.extend_from_slice(&[r, g]),
        ImageFormat::BGR565 => {
            let w = (quantize(r, 5) << 11) | (quantize(g, 6) << 5) | quantize(b, 5);
            out.extend_from_slice(&w.to_le_bytes())
        }
        ImageFormat::RGB565 => {
            let w = (quantize(b, 5) << 11) | (quantize(g, 6) << 5) | quantize(r, 5);
            out.extend_from_slice(&w.to_le_bytes())
        }
        ImageFormat::BGRA5551 | ImageFormat::BGRX5551 => {
            let alpha = format == ImageFormat::BGRX5551 || a >= 128;
            let w = ((alpha as u16) << 15)
                | (quantize(r, 5) << 10)
                | (quantize(g, 5) << 5)
                | quantize(b, 5);
            out.extend_from_slice(&w.to_le_bytes())
        }
        ImageFormat::BGRA4444 => {
            let w = (quantize(a, 4) << 12)
                | (quantize(r, 4) << 8)
                | (quantize(g, 4) << 4)
                | quantize(b, 4);
            out.extend_from_slice(&w.to_le_bytes())
        }
        ImageFormat::RGBA16161616 => {
            for c in px {
                out.extend_from_slice(&(c as u16 * 257).to_le_bytes());
            }
        }
        ImageFormat::RGBA16161616F => {
            for c in px {
                out.extend_from_slice(&f16::from_f32(u8_to_unit(c)).to_le_bytes());
            }
        }
        ImageFormat::RGBA32323232F => {
            for c in px {
                out.extend_from_slice(&u8_to_unit(c).to_le_bytes());
            }
        }
        ImageFormat::RGB323232F => {
            for c in [r, g, b] {
                out.extend_from_slice(&u8_to_unit(c).to_le_bytes());
            }
        }
        _ => unreachable!("{format} is not a per-pixel format"),
    }
}
