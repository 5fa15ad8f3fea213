use tetra_core::BitBuffer;

/// Remove fill bits, 23.4.3.2: if the final bit is 1 it is the only fill
/// bit; otherwise the trailing zeros and the 1 preceding them are padding.
/// Shrinks the buffer window in place. A window of only zeros is left
/// untouched with a warning, since the marker bit is missing.
pub fn strip(pdu: &mut BitBuffer) {
    let len = pdu.get_len();
    let mut idx = len as isize - 1;
    while idx >= 0 && pdu.peek_bits_startoffset(idx as usize, 1) == Some(0) {
        idx -= 1;
    }

    if idx < 0 {
        tracing::warn!("no fill bits found");
        return;
    }

    pdu.set_raw_end(pdu.get_raw_start() + idx as usize);
}
