use tetra_core::{BitBuffer, LogicalChannel};

use crate::coding::convenc::{self, ConvEncState, PUNCTURED};
use crate::coding::{crc16, errorcontrol_params, interleaver, rm3014, scrambler, viterbi};

const MAX_TYPE2_BITS: usize = 288;
const MAX_TYPE345_BITS: usize = 432;

/// Decodes a control plane block from type5 to type1 bits.
/// Handles every CP channel except the AACH.
///
/// Returns the type1 bits and whether the CRC check passed. Callers discard
/// the block on CRC failure; the bits are still returned for logging.
pub fn decode_cp(lchan: LogicalChannel, block: BitBuffer, scrambling_code: u32) -> (BitBuffer, bool) {
    // Intermediate buffers for the decoding stages, sized for the largest
    // block. The mother stream is pre-filled with erasure marks.
    let mut type4_arr = [0u8; MAX_TYPE345_BITS];
    let mut type3_arr = [0u8; MAX_TYPE345_BITS];
    let mut type3dp_arr = [PUNCTURED; MAX_TYPE345_BITS * 4];
    let mut type2_arr = [0u8; MAX_TYPE2_BITS];

    assert!(lchan != LogicalChannel::Aach && !lchan.is_traffic());
    let params = errorcontrol_params::get_params(lchan);

    let mut type5 = block;
    assert!(
        type5.get_len_remaining() == params.type345_bits,
        "decode_cp: block length {} does not match type5 length {} for {:?}",
        type5.get_len_remaining(), params.type345_bits, lchan
    );
    tracing::trace!("decode_cp {:?} type5: {}", lchan, type5.dump_bin());

    // Unscrambling, type5 -> type4
    scrambler::tetra_scramb_bits(scrambling_code, &mut type5);
    let mut type4 = type5;
    tracing::trace!("decode_cp {:?} type4: {}", lchan, type4.dump_bin());

    // De-interleaving, type4 -> type3
    type4.to_bitarr(&mut type4_arr[0..params.type345_bits]);
    interleaver::block_deinterleave(params.type345_bits, params.interleave_a, &type4_arr, &mut type3_arr);

    // De-puncturing, type3 -> type3dp (mother stream with erasures)
    convenc::depuncture23(&type3_arr, params.type345_bits, &mut type3dp_arr);

    // Viterbi, type3dp -> type2
    viterbi::decode_depunctured(&type3dp_arr, &mut type2_arr, params.type2_bits);
    tracing::trace!(
        "decode_cp {:?} type2: {}",
        lchan,
        BitBuffer::from_bitarr(&type2_arr[0..params.type2_bits]).dump_bin()
    );

    // CRC check, type2 -> type1
    assert!(params.have_crc16);
    let crc = crc16::crc16_ccitt_bits(&type2_arr, params.type1_bits + 16);
    let crc_ok = crc == crc16::TETRA_CRC_OK;
    let type1 = BitBuffer::from_bitarr(&type2_arr[0..params.type1_bits]);

    (type1, crc_ok)
}

/// Encodes a control plane block from type1 to type5 bits, the inverse of
/// `decode_cp`. Used by loopback tests and fixture generation.
pub fn encode_cp(lchan: LogicalChannel, mut type1: BitBuffer, scrambling_code: u32) -> BitBuffer {
    assert!(lchan != LogicalChannel::Aach && !lchan.is_traffic());
    let params = errorcontrol_params::get_params(lchan);

    assert!(
        type1.get_len() == params.type1_bits,
        "encode_cp: block length {} does not match type1 length {} for {:?}",
        type1.get_len(), params.type1_bits, lchan
    );

    // type1 bits into an array, with room for the CRC and tail
    type1.seek(0);
    let mut type2_arr = [0u8; MAX_TYPE2_BITS];
    type1.to_bitarr(&mut type2_arr[0..params.type1_bits]);

    // CRC addition, type1 -> type2 (tail bits remain zero)
    let crc = !crc16::crc16_ccitt_bits(&type2_arr[0..params.type1_bits], params.type1_bits);
    for i in 0..16 {
        type2_arr[params.type1_bits + i] = ((crc >> (15 - i)) & 1) as u8;
    }

    // Convolutional encoding, type2 -> mother stream
    let mut type3dp_arr = [0u8; MAX_TYPE345_BITS * 4];
    let mut ces = ConvEncState::new();
    ces.encode(&type2_arr[0..params.type2_bits], &mut type3dp_arr);

    // Puncturing, mother stream -> type3
    let mut type3_arr = [0u8; MAX_TYPE345_BITS];
    convenc::puncture23(&type3dp_arr, &mut type3_arr[0..params.type345_bits]);

    // Interleaving, type3 -> type4
    let mut type4_arr = [0u8; MAX_TYPE345_BITS];
    interleaver::block_interleave(params.type345_bits, params.interleave_a, &type3_arr, &mut type4_arr);
    let mut type4 = BitBuffer::from_bitarr(&type4_arr[0..params.type345_bits]);

    // Scrambling, type4 -> type5
    scrambler::tetra_scramb_bits(scrambling_code, &mut type4);
    type4
}

/// Decodes an AACH block: unscramble, then Reed-Muller (30,14) correct.
/// Returns the 14 type1 bits.
pub fn decode_aach(block: BitBuffer, scrambling_code: u32) -> BitBuffer {
    let mut type5 = block;
    assert!(type5.get_len_remaining() == 30);

    // Unscrambling, type5 -> type2. No interleaving or puncturing for AACH.
    scrambler::tetra_scramb_bits(scrambling_code, &mut type5);
    let mut type2 = type5;

    let x = type2.read_bits(30).unwrap() as u32; // length checked above
    let y = rm3014::tetra_rm3014_decode(x);

    let mut type1 = BitBuffer::new(14);
    type1.write_bits(y as u64, 14);
    type1.seek(0);
    tracing::debug!("decode_aach type1: {}", type1.dump_bin());
    type1
}

/// Encodes a 14-bit AACH block to its 30 type5 bits.
pub fn encode_aach(block: BitBuffer, scrambling_code: u32) -> BitBuffer {
    let mut type1 = block;
    assert!(type1.get_len_remaining() == 14);

    let type1_int = type1.read_bits(14).unwrap() as u16; // length checked above
    let type2_int = rm3014::tetra_rm3014_compute(type1_int);

    let mut type2 = BitBuffer::new(30);
    type2.write_bits(type2_int as u64, 30);
    type2.seek(0);

    scrambler::tetra_scramb_bits(scrambling_code, &mut type2);
    type2
}
