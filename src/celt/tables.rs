//! Static inverse-CDF tables for the small fixed-alphabet symbols CELT codes
//! directly with `RangeDecoder::decode_icdf`/`RangeEncoder::encode_icdf`.

/// Transient (time-frequency split) flag, coded as a single bit; kept here as
/// an icdf for symmetry with the other flags even though a dedicated
/// `decode_bit_logp(1)` call would do the same thing.
pub(crate) const TRANSIENT_ICDF: [u8; 2] = [1, 0];

/// Intra-frame energy prediction flag.
pub(crate) const INTRA_ICDF: [u8; 2] = [1, 0];

/// Spread amount: none, light, normal, aggressive.
pub(crate) const SPREAD_ICDF: [u8; 4] = [25, 23, 2, 0];

/// Post-filter tapset selector.
pub(crate) const TAPSET_ICDF: [u8; 3] = [2, 1, 0];

/// Allocation trim: skews the bit allocation curve towards low (small values)
/// or high (large values) bands. Centered at 5.
pub(crate) const TRIM_ICDF: [u8; 11] = [126, 124, 119, 109, 87, 41, 19, 9, 4, 2, 0];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid_icdf(icdf: &[u8]) {
        assert_eq!(*icdf.last().unwrap(), 0);
        for w in icdf.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }

    #[test]
    fn test_icdf_tables_are_well_formed() {
        assert_valid_icdf(&TRANSIENT_ICDF);
        assert_valid_icdf(&INTRA_ICDF);
        assert_valid_icdf(&SPREAD_ICDF);
        assert_valid_icdf(&TAPSET_ICDF);
        assert_valid_icdf(&TRIM_ICDF);
    }
}
