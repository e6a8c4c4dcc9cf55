//! Streaming of DODS payloads.
//!
//! The encoder is a blocking iterator, so each chunk is produced on the
//! blocking pool. The body stream is polled by hyper only when the connection
//! can take more data, and dropping the body drops the encoder, so a slow or
//! departed client never causes further reads.

use axum::body::Body;
use bytes::Bytes;
use dap_protocol::{DapError, DodsChunks};
use futures::stream::{self, Stream, StreamExt};
use metrics::counter;

/// Body of a `.dods` response: `head` (DDS text and data marker) followed by
/// the encoded payload.
pub fn dods_body(head: Bytes, chunks: DodsChunks) -> Body {
    let head = stream::once(async move { Ok::<_, DapError>(head) });
    Body::from_stream(head.chain(chunk_stream(chunks)))
}

/// Pull `chunks` one at a time, yielding to the scheduler after each.
pub fn chunk_stream(chunks: DodsChunks) -> impl Stream<Item = Result<Bytes, DapError>> + Send {
    stream::unfold(Some(chunks), |state| async move {
        let mut chunks = state?;

        let produced = tokio::task::spawn_blocking(move || {
            let next = chunks.next();
            (next, chunks)
        })
        .await;

        let (next, chunks) = match produced {
            Ok(pair) => pair,
            Err(e) => {
                let err = DapError::Internal(format!("encoder task failed: {}", e));
                tracing::error!("Aborting DODS stream: {}", err);
                return Some((Err(err), None));
            }
        };

        tokio::task::yield_now().await;

        match next? {
            Ok(chunk) => {
                counter!("dap_bytes_streamed_total").increment(chunk.len() as u64);
                Some((Ok(chunk), Some(chunks)))
            }
            Err(err) => {
                tracing::error!("Aborting DODS stream: {}", err);
                counter!("dap_errors_total", "class" => err.class().as_str()).increment(1);
                Some((Err(err), None))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dap_protocol::{DType, DatasetBuilder, Dimension, MemorySource, Values};
    use test_utils::CountingSource;

    #[tokio::test]
    async fn test_stream_matches_iterator() {
        let source = MemorySource::new(vec![2, 2], Values::Int32(vec![1, 2, 3, 4])).unwrap();
        let (dataset, _) = DatasetBuilder::new("d")
            .array(
                "v",
                vec![Dimension::new("y", 2), Dimension::new("x", 2)],
                DType::Int32,
                Arc::new(source),
                vec![],
            )
            .build();

        let expected = DodsChunks::new(&dataset).collect_bytes().unwrap();
        let streamed: Vec<Bytes> = chunk_stream(DodsChunks::new(&dataset))
            .map(|c| c.unwrap())
            .collect()
            .await;

        assert_eq!(streamed.len(), 3);
        assert_eq!(streamed.concat(), expected);
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_reading() {
        let source = Arc::new(CountingSource::new(vec![1000, 10]));
        let (dataset, _) = DatasetBuilder::new("d")
            .array(
                "v",
                vec![Dimension::new("y", 1000), Dimension::new("x", 10)],
                DType::Float32,
                source.clone(),
                vec![],
            )
            .build();

        let taken: Vec<_> = chunk_stream(DodsChunks::new(&dataset)).take(3).collect().await;
        assert_eq!(taken.len(), 3);
        assert_eq!(source.reads(), 2);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let source = MemorySource::new(vec![2], Values::Int32(vec![1, 2])).unwrap();
        let (dataset, _) = DatasetBuilder::new("d")
            .array(
                "v",
                vec![Dimension::new("x", 2)],
                DType::Float32,
                Arc::new(source),
                vec![],
            )
            .build();

        let items: Vec<_> = chunk_stream(DodsChunks::new(&dataset)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
