//! Criterion benchmarks for the per-connection protocol work.
//!
//! Every accepted connection pays for one tokenize + negotiate, and upgraded
//! connections additionally pay for one SHA-1 + Base64.  On the single-slot
//! server this work sits directly on the accept path.
//!
//! Run with:
//! ```bash
//! cargo bench --package traffic-core --bench handshake_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use traffic_core::{derive_accept_key, negotiate, HttpRequest, TrafficState, WEBSOCKET_GUID};

const UPGRADE_REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
Host: 192.168.4.1\r\n\
Upgrade: websocket\r\n\
Connection: Upgrade\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Sec-WebSocket-Version: 13\r\n\r\n";

const STATE_REQUEST: &[u8] = b"GET /traffic_state HTTP/1.1\r\nHost: 192.168.4.1\r\nAccept: */*\r\n\r\n";

fn bench_derive_accept_key(c: &mut Criterion) {
    c.bench_function("derive_accept_key", |b| {
        b.iter(|| derive_accept_key(black_box("dGhlIHNhbXBsZSBub25jZQ=="), WEBSOCKET_GUID))
    });
}

fn bench_parse_and_negotiate(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_negotiate");

    group.bench_function("upgrade", |b| {
        b.iter(|| {
            let req = HttpRequest::parse(black_box(UPGRADE_REQUEST)).unwrap();
            negotiate(&req, WEBSOCKET_GUID)
        })
    });

    group.bench_function("plain", |b| {
        b.iter(|| {
            let req = HttpRequest::parse(black_box(STATE_REQUEST)).unwrap();
            negotiate(&req, WEBSOCKET_GUID)
        })
    });

    group.finish();
}

fn bench_state_document(c: &mut Criterion) {
    let state = TrafficState::YJunction("Y-Junction State: 0x21".to_string());
    c.bench_function("traffic_state_to_json", |b| {
        b.iter(|| black_box(&state).to_json().unwrap())
    });
}

criterion_group!(
    benches,
    bench_derive_accept_key,
    bench_parse_and_negotiate,
    bench_state_document
);
criterion_main!(benches);
