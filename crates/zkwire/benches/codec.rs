// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Benchmark
//!
//! Measures the hot path of every received frame:
//! - registry lookup + payload decode for small and path-heavy messages
//! - length-prefix framing over an in-memory stream
//! - watch fan-out to many subscribers of one path

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use zkwire::protocol::{FrameCodec, WatchNotification};
use zkwire::{Message, Protocol, WatchEvent, WatchEventKind, WatchRegistry};

fn notification(path_len: usize) -> Message {
    Message::WatchNotification(WatchNotification {
        kind: WatchEventKind::NodeUpdated,
        path: format!("/{}", "n".repeat(path_len)),
    })
}

fn bench_protocol_decode(c: &mut Criterion) {
    let protocol = Protocol::standard();
    let mut group = c.benchmark_group("protocol_decode");

    let ping = protocol.encode(&Message::Ping).expect("encode ping");
    group.bench_function("ping", |b| {
        b.iter(|| protocol.decode(black_box(&ping)).expect("decode"));
    });

    for path_len in [16usize, 256, 4096] {
        let packet = protocol.encode(&notification(path_len)).expect("encode");
        group.throughput(Throughput::Bytes(packet.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("watch_notification", path_len),
            &packet,
            |b, packet| b.iter(|| protocol.decode(black_box(packet)).expect("decode")),
        );
    }
    group.finish();
}

fn bench_frame_codec(c: &mut Criterion) {
    let protocol = Protocol::standard();
    let body = protocol.encode(&notification(64)).expect("encode");
    let mut stream = Vec::new();
    for _ in 0..1000 {
        FrameCodec::encode_into(&body, &mut stream).expect("frame");
    }

    let mut group = c.benchmark_group("frame_codec");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("decode_1000_frames", |b| {
        b.iter(|| {
            let mut reader = &stream[..];
            let mut codec = FrameCodec::with_default_max();
            while let Some(frame) = codec.decode(&mut reader).expect("decode") {
                black_box(frame);
                if reader.is_empty() {
                    break;
                }
            }
        });
    });
    group.finish();
}

fn bench_watch_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("watch_dispatch");
    for subscribers in [1usize, 16, 128] {
        let registry = WatchRegistry::new(1024);
        let watches: Vec<_> = (0..subscribers).map(|_| registry.register("/bench")).collect();
        let event = WatchEvent::new(WatchEventKind::NodeUpdated, "/bench");

        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    registry.dispatch(black_box(&event));
                    for watch in &watches {
                        black_box(watch.try_recv());
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_protocol_decode,
    bench_frame_codec,
    bench_watch_dispatch
);
criterion_main!(benches);
