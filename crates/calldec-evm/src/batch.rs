//! Rayon-powered batch decoding.
//!
//! One `CallDecoder` is shared by every worker; each payload gets its own
//! reader and value tree, so no locking is needed.

use calldec_core::{
    decoder::{BatchDecodeResult, ErrorMode},
    error::{BatchDecodeError, DecodeError},
    DecodedCall,
};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::call_decoder::CallDecoder;

/// Decode a slice of hex calldata payloads in parallel.
///
/// Successful calls keep their input index and input order. In `Throw` mode
/// the error with the lowest input index aborts the batch.
pub fn decode_batch<S>(
    decoder: &CallDecoder,
    calldatas: &[S],
    mode: ErrorMode,
) -> Result<BatchDecodeResult, BatchDecodeError>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<(usize, Result<DecodedCall, DecodeError>)> = calldatas
        .par_iter()
        .enumerate()
        .map(|(idx, hex)| (idx, decoder.decode_call(hex.as_ref())))
        .collect();

    let mut out = BatchDecodeResult {
        total_input: calldatas.len(),
        ..Default::default()
    };
    for (idx, result) in results {
        match result {
            Ok(call) => out.calls.push((idx, call)),
            Err(err) => match mode {
                ErrorMode::Skip => {}
                ErrorMode::Collect => out.errors.push((idx, err)),
                ErrorMode::Throw => {
                    return Err(BatchDecodeError::ItemFailed {
                        index: idx,
                        source: err,
                    })
                }
            },
        }
    }
    Ok(out)
}

/// Split `calldatas` into chunks of at most `chunk_size` and decode each
/// chunk in parallel. Indices in the result refer to the whole input.
pub fn decode_batch_chunked<S>(
    decoder: &CallDecoder,
    calldatas: &[S],
    mode: ErrorMode,
    chunk_size: usize,
) -> Result<BatchDecodeResult, BatchDecodeError>
where
    S: AsRef<str> + Sync,
{
    if chunk_size == 0 {
        return Err(BatchDecodeError::Other("chunk_size must be at least 1".into()));
    }

    info!(
        "batch: decoding {} payloads (chunk_size={})",
        calldatas.len(),
        chunk_size
    );

    let mut all = BatchDecodeResult {
        total_input: calldatas.len(),
        ..Default::default()
    };
    let mut offset = 0usize;

    for chunk in calldatas.chunks(chunk_size) {
        let result = decode_batch(decoder, chunk, mode).map_err(|e| match e {
            BatchDecodeError::ItemFailed { index, source } => BatchDecodeError::ItemFailed {
                index: offset + index,
                source,
            },
            other => other,
        })?;
        all.calls
            .extend(result.calls.into_iter().map(|(i, c)| (offset + i, c)));
        all.errors
            .extend(result.errors.into_iter().map(|(i, e)| (offset + i, e)));
        offset += chunk.len();
    }

    if !all.errors.is_empty() {
        warn!("batch: {} payloads failed to decode", all.errors.len());
    }
    info!(
        "batch: complete: {} decoded ({} unknown), {} errors",
        all.calls.len(),
        all.unknown_count(),
        all.errors.len()
    );
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calldec_core::config::DecoderConfig;

    const ABI: &str = r#"[{"name":"transfer","type":"function","inputs":[
        {"name":"to","type":"address"},{"name":"amount","type":"uint256"}]}]"#;

    fn decoder() -> CallDecoder {
        CallDecoder::from_abi_json(ABI, DecoderConfig::default()).unwrap()
    }

    fn transfer(amount: u8) -> String {
        format!(
            "0xa9059cbb{}{:064x}",
            "000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045", amount
        )
    }

    fn inputs() -> Vec<String> {
        vec![
            transfer(1),
            "not hex".to_string(),
            "0xdeadbeef".to_string(),
            transfer(2),
        ]
    }

    #[test]
    fn skip_mode_drops_failures() {
        let result = decode_batch(&decoder(), &inputs(), ErrorMode::Skip).unwrap();
        assert_eq!(result.total_input, 4);
        assert_eq!(result.calls.len(), 3);
        assert!(result.errors.is_empty());
        assert_eq!(result.unknown_count(), 1);
        let indices: Vec<_> = result.calls.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn collect_mode_keeps_error_index() {
        let result = decode_batch(&decoder(), &inputs(), ErrorMode::Collect).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].0, 1);
        assert!(matches!(result.errors[0].1, DecodeError::MalformedHex { .. }));
    }

    #[test]
    fn throw_mode_aborts() {
        let err = decode_batch(&decoder(), &inputs(), ErrorMode::Throw).unwrap_err();
        assert!(matches!(err, BatchDecodeError::ItemFailed { index: 1, .. }));
    }

    #[test]
    fn chunked_indices_are_global() {
        let result = decode_batch_chunked(&decoder(), &inputs(), ErrorMode::Collect, 3).unwrap();
        assert_eq!(result.calls.len(), 3);
        assert_eq!(result.calls.last().map(|(i, _)| *i), Some(3));
        assert_eq!(result.errors[0].0, 1);

        let err = decode_batch_chunked(&decoder(), &inputs()[2..], ErrorMode::Throw, 1);
        assert!(err.is_ok());
        assert!(decode_batch_chunked(&decoder(), &inputs(), ErrorMode::Skip, 0).is_err());
    }
}
