//! Decoding of backing-store filter pipelines into [`Compression`] settings.
//!
//! Filter names are matched by prefix, so `deflate_v1` counts as deflate.
//! Entries are scanned in pipeline order and a later compression filter
//! overrides an earlier one. Unknown filters are ignored.

use canopy_store::FilterPipeline;
use canopy_types::{Compression, CompressionLibrary};
use tracing::debug;

/// Decode a filter pipeline into `(level, library, shuffle)`.
///
/// With no pipeline, or an empty one, the result is the default: level 0,
/// zlib, no shuffle. A compression filter without parameters sets level 0.
pub fn decode_filters(pipeline: Option<&FilterPipeline>) -> Compression {
    let mut compression = Compression::default();
    let Some(pipeline) = pipeline else {
        return compression;
    };

    for entry in pipeline {
        let name = entry.name.as_str();
        let library = if name.starts_with("lzo") {
            CompressionLibrary::Lzo
        } else if name.starts_with("ucl") {
            CompressionLibrary::Ucl
        } else if name.starts_with("deflate") {
            CompressionLibrary::Zlib
        } else {
            if name.starts_with("shuffle") {
                compression.shuffle = true;
            }
            continue;
        };
        compression.level = entry.first_param().unwrap_or(0);
        compression.library = library;
    }

    debug!(
        level = compression.level,
        library = %compression.library,
        shuffle = compression.shuffle,
        "decoded filters"
    );
    compression
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_selects_zlib() {
        let pipeline = FilterPipeline::new().with("deflate_v1", vec![6]);
        assert_eq!(
            decode_filters(Some(&pipeline)),
            Compression::new(6, CompressionLibrary::Zlib, false)
        );
    }

    #[test]
    fn lzo_with_shuffle() {
        let pipeline = FilterPipeline::new()
            .with("lzo_a", vec![3])
            .with("shuffle_b", vec![]);
        assert_eq!(
            decode_filters(Some(&pipeline)),
            Compression::new(3, CompressionLibrary::Lzo, true)
        );
    }

    #[test]
    fn empty_pipeline_gives_defaults() {
        assert_eq!(decode_filters(Some(&FilterPipeline::new())), Compression::default());
        assert_eq!(decode_filters(None), Compression::default());
    }

    #[test]
    fn ucl_uses_first_parameter() {
        let pipeline = FilterPipeline::new().with("ucl", vec![9, 1, 2]);
        assert_eq!(
            decode_filters(Some(&pipeline)),
            Compression::new(9, CompressionLibrary::Ucl, false)
        );
    }

    #[test]
    fn last_compression_filter_wins() {
        let pipeline = FilterPipeline::new()
            .with("deflate", vec![6])
            .with("shuffle", vec![])
            .with("lzo", vec![1]);
        assert_eq!(
            decode_filters(Some(&pipeline)),
            Compression::new(1, CompressionLibrary::Lzo, true)
        );
    }

    #[test]
    fn shuffle_alone_keeps_level_zero() {
        let pipeline = FilterPipeline::new().with("shuffle", vec![4]);
        assert_eq!(
            decode_filters(Some(&pipeline)),
            Compression::new(0, CompressionLibrary::Zlib, true)
        );
    }

    #[test]
    fn unknown_filters_are_ignored() {
        let pipeline = FilterPipeline::new()
            .with("fletcher32", vec![])
            .with("szip", vec![32]);
        assert_eq!(decode_filters(Some(&pipeline)), Compression::default());
    }

    #[test]
    fn matching_is_by_prefix_only() {
        let pipeline = FilterPipeline::new().with("my_deflate", vec![5]);
        assert_eq!(decode_filters(Some(&pipeline)), Compression::default());
    }

    #[test]
    fn compressor_without_params_has_level_zero() {
        let pipeline = FilterPipeline::new().with("deflate", vec![]);
        let decoded = decode_filters(Some(&pipeline));
        assert_eq!(decoded.level, 0);
        assert!(!decoded.is_compressed());
    }
}
