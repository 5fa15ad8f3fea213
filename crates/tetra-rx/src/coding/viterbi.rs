use crate::coding::convenc::PUNCTURED;

/// Type used to represent input bits.
/// "0" is represented as -1, "1" as +1, and a punctured bit as 0, so the
/// depunctured erasures simply contribute nothing to the branch metrics.
pub type SoftBit = i8;

/// Type used to accumulate path metrics.
/// 16 bits are enough for our block lengths without renormalization.
type Metric = i16;

/// Constraint length of the code. Fixed rather than generic since it also
/// pins NUM_STATES and the DecisionBitmap width.
const K: usize = 5;

const NUM_STATES: usize = num_states(K);

/// Unsigned integer type storing one traceback decision bit per state.
type DecisionBitmap = u16;

/// Number of states for a given constraint length.
pub const fn num_states(k: usize) -> usize {
    1 << (k - 1)
}

/// Viterbi decoder for a binary convolutional code of rate 1/N.
pub struct ViterbiDecoder<const N: usize> {
    /// Expected encoder outputs for each state for encoder input "0".
    expected_0: [[SoftBit; NUM_STATES]; N],
}

impl<const N: usize> ViterbiDecoder<N> {
    pub fn new_with_polynomials(generator_polynomials: &[[bool; K]; N]) -> Self {
        // With the generator polynomials used here, the expected outputs
        // for a "1" input are the inverse of those for "0", so only the
        // "0" table is generated and results are negated as needed.
        let expected_0 = std::array::from_fn(|poly_n| {
            let poly = generator_polynomials[poly_n];
            std::array::from_fn(|state| {
                let mut encoder_output: bool = false;
                // each bit of the state number is one past encoder input
                for bit_i in 0..K - 1 {
                    let past_input_bit = (state & (1 << (K - 2 - bit_i))) != 0;
                    if past_input_bit && poly[bit_i] {
                        encoder_output = !encoder_output;
                    }
                }
                if encoder_output { 1 as SoftBit } else { -1 as SoftBit }
            })
        });
        Self { expected_0 }
    }

    pub fn decode(&self, received_bits: &[SoftBit]) -> Vec<u8> {
        let num_output_bits = received_bits.len() / N;
        let mut trellis_decisions: Vec<DecisionBitmap> = Vec::with_capacity(num_output_bits);

        // Accumulated path metrics. The encoder starts in state 0; every
        // other state begins half way to the metric ceiling so it cannot
        // win, but still has room to accumulate without overflow.
        let mut metrics: [Metric; NUM_STATES] = [Metric::MAX / 2; NUM_STATES];
        metrics[0] = 0;

        for received in received_bits.chunks_exact(N) {
            // Branch metrics for encoder input "0".
            let mut branch_metrics_0: [Metric; NUM_STATES] = [0; NUM_STATES];

            for (received_bit, expected_0) in received.iter().zip(self.expected_0.iter()) {
                for (branch_metric_0, expected_bit_0) in
                    branch_metrics_0.iter_mut().zip(expected_0.iter())
                {
                    *branch_metric_0 -= (received_bit * expected_bit_0) as Metric;
                }
            }

            let mut decisions: DecisionBitmap = 0;

            metrics = std::array::from_fn(|state| {
                // Predecessor states for encoder input 0 and 1.
                let predecessor_0 = (state * 2) % NUM_STATES;
                let predecessor_1 = predecessor_0 + 1;
                let metric_0 = metrics[predecessor_0] + branch_metrics_0[state];
                // "1"-input branch metrics are the negation of the "0" ones.
                let metric_1 = metrics[predecessor_1] - branch_metrics_0[state];

                if metric_1 < metric_0 {
                    // One decision bit per state is enough: each state has
                    // exactly two possible predecessors.
                    decisions |= 1 << state;
                    metric_1
                } else {
                    metric_0
                }
            });
            trellis_decisions.push(decisions);
        }

        // Traceback. The zero-padded tail drives the encoder back to state 0.
        let mut best_state = 0;

        let mut decoded_bits: Vec<u8> = Vec::with_capacity(num_output_bits);
        for decisions in trellis_decisions.iter().rev() {
            decoded_bits.push(((best_state >> (K - 2)) & 1) as u8);
            best_state = best_state * 2 % NUM_STATES + ((*decisions >> best_state) & 1) as usize;
        }
        decoded_bits.reverse();
        decoded_bits
    }
}

/// Decoder for the rate-1/4 mother code of 8.2.3.1.1. The polynomials are
/// the generator taps in reversed bit order: 10011, 11101, 10111, 11011.
pub type TetraViterbiDecoder = ViterbiDecoder<4>;

impl TetraViterbiDecoder {
    pub fn new() -> Self {
        Self::new_with_polynomials(&[
            [true, true, false, false, true],
            [true, false, true, true, true],
            [true, true, true, false, true],
            [true, true, false, true, true],
        ])
    }
}

impl Default for TetraViterbiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a depunctured mother-code stream (0/1 bits with `PUNCTURED`
/// erasure marks) into `info_len` information bits.
pub fn decode_depunctured(in_buf: &[u8], out_buf: &mut [u8], info_len: usize) {
    assert!(in_buf.len() >= info_len * 4, "in_buf too short");
    assert!(out_buf.len() >= info_len, "out_buf too short");

    let soft: Vec<SoftBit> = in_buf[..info_len * 4]
        .iter()
        .map(|&b| match b {
            0x00 => -1,
            0x01 => 1,
            PUNCTURED => 0,
            _ => panic!("decode_depunctured: invalid input symbol {}", b),
        })
        .collect();

    let decoder = TetraViterbiDecoder::new();
    let decoded = decoder.decode(&soft);
    out_buf[..info_len].copy_from_slice(&decoded[..info_len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::convenc;

    #[test]
    fn test_decoder_with_punctures() {
        // Random message with 4 zero tail bits
        let message: Vec<u8> = (0..288)
            .map(|_| rand::random_range(0..2))
            .chain((0..4).map(|_| 0))
            .collect();

        let mut encoder = convenc::ConvEncState::new();
        let mut encoded = vec![0u8; message.len() * 4];
        encoder.encode(&message[..], &mut encoded[..]);

        // Puncture a lot of bits, not following any TETRA pattern, just to
        // check the decoder rides over erasures.
        let encoded_soft: Vec<i8> = encoded
            .into_iter()
            .enumerate()
            .map(|(i, bit)| {
                if i % 3 > 0 {
                    0 // puncture
                } else if bit != 0 {
                    1
                } else {
                    -1
                }
            })
            .collect();

        let decoder = TetraViterbiDecoder::new();
        let decoded_message = decoder.decode(&encoded_soft[..]);

        assert!(decoded_message[..] == message[..]);
    }

    #[test]
    fn test_decoder_noiseless_rate23() {
        // A BSCH-sized block (60 data + 16 crc + 4 tail) through the real
        // encode path: encode, puncture 2/3, depuncture, decode.
        let message: Vec<u8> = (0..76)
            .map(|i| ((i * 13) % 7 < 3) as u8)
            .chain((0..4).map(|_| 0))
            .collect();

        let mut encoder = convenc::ConvEncState::new();
        let mut mother = vec![0u8; message.len() * 4];
        encoder.encode(&message, &mut mother);

        let mut punctured = vec![0u8; 120];
        convenc::puncture23(&mother, &mut punctured);

        let mut depunctured = vec![convenc::PUNCTURED; message.len() * 4];
        convenc::depuncture23(&punctured, 120, &mut depunctured);

        let mut decoded = vec![0u8; 80];
        decode_depunctured(&depunctured, &mut decoded, 80);
        assert_eq!(&decoded[..], &message[..]);
    }
}
