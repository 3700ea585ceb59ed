use rand::Rng;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Generate a note id in the canonical UUID v4 textual layout.
/// Local-only ids, so `thread_rng` is plenty; the format is what matters.
pub fn new_note_id() -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(36);
    for position in 0..36 {
        match position {
            8 | 13 | 18 | 23 => out.push('-'),
            14 => out.push('4'),
            19 => out.push(HEX[rng.gen_range(8..12)] as char),
            _ => out.push(HEX[rng.gen_range(0..16)] as char),
        }
    }
    out
}
