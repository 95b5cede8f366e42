#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves a single HTTP response with the given status line and body, then closes.
/// Returns the URL to request.
pub async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            // Read until the end of the request headers.
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}/trip-data/yellow_tripdata_2025-01.parquet", addr)
}

/// A URL on a local port nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/missing.parquet", addr)
}

/// Builds a small Parquet file laid out like a TLC yellow taxi file (`VendorID`, Int32 ids,
/// Float64 passenger counts, microsecond timestamps, extra columns).
#[cfg(feature = "parquet")]
pub fn tlc_parquet_bytes() -> Vec<u8> {
    use arrow::array::{
        ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray,
    };
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    let schema = Arc::new(Schema::new(vec![
        Field::new("VendorID", DataType::Int32, true),
        Field::new(
            "tpep_pickup_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
        Field::new(
            "tpep_dropoff_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
        Field::new("passenger_count", DataType::Float64, true),
        Field::new("trip_distance", DataType::Float64, true),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
        Field::new("payment_type", DataType::Int64, true),
        Field::new("fare_amount", DataType::Float64, true),
        Field::new("total_amount", DataType::Float64, true),
    ]));
    // 2025-01-01T00:18:38 and 2025-01-01T00:32:23 and 2025-01-02T10:00:00
    let pickups = vec![1_735_690_718_000_000i64, 1_735_691_543_000_000, 1_735_812_000_000_000];
    let dropoffs: Vec<i64> = pickups.iter().map(|p| p + 600_000_000).collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(vec![1, 2, 2])),
        Arc::new(TimestampMicrosecondArray::from(pickups)),
        Arc::new(TimestampMicrosecondArray::from(dropoffs)),
        Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0), None])),
        Arc::new(Float64Array::from(vec![1.6, 0.5, 3.2])),
        Arc::new(StringArray::from(vec!["N", "N", "Y"])),
        Arc::new(Int64Array::from(vec![1, 2, 1])),
        Arc::new(Float64Array::from(vec![10.0, 5.1, 14.2])),
        Arc::new(Float64Array::from(vec![18.0, 9.95, 20.5])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut bytes = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut bytes, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    bytes
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Status output captured from a stage run.
pub fn captured(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .lines()
        .map(str::to_string)
        .collect()
}
