/// Block interleaving (Clause 8.2.4): bit i of the input block lands at
/// position 1 + (a*i mod k) of the output block, 1-based.
pub const fn block_interl_func(k: u32, a: u32, i: u32) -> u32 {
    1 + ((a.wrapping_mul(i)) % k)
}

pub fn block_interleave(k: usize, a: usize, input: &[u8], output: &mut [u8]) {
    assert!(input.len() >= k && output.len() >= k);
    for i in 1..=k {
        let j = block_interl_func(k as u32, a as u32, i as u32) as usize;
        output[j - 1] = input[i - 1];
    }
}

pub fn block_deinterleave(k: usize, a: usize, input: &[u8], output: &mut [u8]) {
    assert!(input.len() >= k && output.len() >= k);
    for i in 1..=k {
        let j = block_interl_func(k as u32, a as u32, i as u32) as usize;
        output[i - 1] = input[j - 1];
    }
}
