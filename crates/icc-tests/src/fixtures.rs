//! Hand-assembled profile bytes
//!
//! These build profiles without going through `MutableProfile`, so parse
//! tests do not depend on the serializer they check.

/// D50 as s15Fixed16
const D50_FIXED: [u32; 3] = [0x0000_F6D6, 0x0001_0000, 0x0000_D32D];

fn be32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

fn fixed(v: f64) -> [u8; 4] {
    ((v * 65536.0).round() as i32).to_be_bytes()
}

/// 128-byte v4.3 header with the size field left at zero
pub fn header(class: &[u8; 4], space: &[u8; 4], pcs: &[u8; 4]) -> Vec<u8> {
    let mut h = vec![0u8; 128];
    h[8..12].copy_from_slice(&be32(0x0430_0000));
    h[12..16].copy_from_slice(class);
    h[16..20].copy_from_slice(space);
    h[20..24].copy_from_slice(pcs);
    h[36..40].copy_from_slice(b"acsp");
    for (i, v) in D50_FIXED.iter().enumerate() {
        h[68 + i * 4..72 + i * 4].copy_from_slice(&be32(*v));
    }
    h
}

/// Header, tag table and 4-aligned payloads; equal payloads are written once
pub fn assemble(mut header: Vec<u8>, tags: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let table_end = 128 + 4 + tags.len() * 12;
    let mut table = be32(tags.len() as u32).to_vec();
    let mut payload: Vec<u8> = Vec::new();
    let mut placed: Vec<(usize, &Vec<u8>)> = Vec::new();

    for (sig, data) in tags {
        let offset = match placed.iter().find(|(_, d)| *d == data) {
            Some((offset, _)) => *offset,
            None => {
                let offset = table_end + payload.len();
                payload.extend_from_slice(data);
                while payload.len() % 4 != 0 {
                    payload.push(0);
                }
                placed.push((offset, data));
                offset
            }
        };
        table.extend_from_slice(*sig);
        table.extend_from_slice(&be32(offset as u32));
        table.extend_from_slice(&be32(data.len() as u32));
    }

    header.extend_from_slice(&table);
    header.extend_from_slice(&payload);
    let size = header.len() as u32;
    header[0..4].copy_from_slice(&be32(size));
    header
}

pub fn xyz_tag(x: f64, y: f64, z: f64) -> Vec<u8> {
    let mut t = b"XYZ \0\0\0\0".to_vec();
    for v in [x, y, z] {
        t.extend_from_slice(&fixed(v));
    }
    t
}

/// `curv` holding a single u8Fixed8 gamma
pub fn gamma_tag(gamma: f64) -> Vec<u8> {
    let mut t = b"curv\0\0\0\0".to_vec();
    t.extend_from_slice(&be32(1));
    t.extend_from_slice(&((gamma * 256.0).round() as u16).to_be_bytes());
    t
}

/// ASCII `text` tag
pub fn text_tag(text: &str) -> Vec<u8> {
    let mut t = b"text\0\0\0\0".to_vec();
    t.extend_from_slice(text.as_bytes());
    t.push(0);
    t
}

/// Display RGB profile with shared gamma TRCs and the given D50 colorants
pub fn matrix_shaper(colorants: [[f64; 3]; 3], gamma: f64) -> Vec<u8> {
    let trc = gamma_tag(gamma);
    assemble(
        header(b"mntr", b"RGB ", b"XYZ "),
        &[
            (b"desc", text_tag("fixture RGB")),
            (b"wtpt", xyz_tag(0.9642, 1.0, 0.8249)),
            (b"rXYZ", xyz_tag(colorants[0][0], colorants[0][1], colorants[0][2])),
            (b"gXYZ", xyz_tag(colorants[1][0], colorants[1][1], colorants[1][2])),
            (b"bXYZ", xyz_tag(colorants[2][0], colorants[2][1], colorants[2][2])),
            (b"rTRC", trc.clone()),
            (b"gTRC", trc.clone()),
            (b"bTRC", trc),
        ],
    )
}

/// sRGB primaries adapted to D50, one column per colorant
pub const SRGB_COLORANTS: [[f64; 3]; 3] = [
    [0.436_07, 0.222_49, 0.013_92],
    [0.385_11, 0.716_87, 0.097_06],
    [0.143_07, 0.060_61, 0.714_10],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_payloads_written_once() {
        let bytes = matrix_shaper(SRGB_COLORANTS, 2.2);
        let count = u32::from_be_bytes([bytes[128], bytes[129], bytes[130], bytes[131]]);
        assert_eq!(count, 8);
        let offset = |i: usize| {
            let at = 132 + i * 12 + 4;
            u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        assert_eq!(offset(5), offset(6));
        assert_eq!(offset(6), offset(7));
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_parses() {
        let profile = oxicc_core::Profile::parse(matrix_shaper(SRGB_COLORANTS, 2.2)).unwrap();
        assert_eq!(profile.tag_count(), 8);
        assert!((profile.estimate_gamma().unwrap() - 2.2).abs() < 0.01);
    }
}
