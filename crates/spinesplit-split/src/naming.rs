//! Stable name construction for sub-entities produced by the splitter.
//!
//! `Population::sub_name`/`sub_pair_name` already cover the two naming
//! schemes; this module adds the one extra key the splitter needs that the
//! model crate has no reason to own: the key under which a split input is
//! deduplicated while it accumulates connections from
//! more than one source index in the same remote sub-population.

use spinesplit_model::sub_name;

/// The key a split input is grouped under while its `ConnectionList` is being
/// assembled: one entry per distinct remote sub-population a given unsplit
/// input draws from.
pub fn split_input_group_key(src: &str, remote_sub: u32, src_port: &str, dst_port: &str) -> String {
    format!("{}_{}_{}", sub_name(src, remote_sub), src_port, dst_port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_key_matches_sub_input_src_key_shape() {
        assert_eq!(
            split_input_group_key("PopA", 2, "spike", "exc"),
            "PopA_sub2_spike_exc"
        );
    }
}
