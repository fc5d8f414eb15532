//! Notification Encoding Benchmarks

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use mat_ageing::{AgeNotification, ContextId, DeviceId, EntryHandle, TableId};

fn bench_encode(c: &mut Criterion) {
    let notification = AgeNotification {
        switch_id: DeviceId(2),
        cxt_id: ContextId(0),
        buffer_id: 1234,
        table_id: TableId(0x1000_0007),
        entries: (0u32..256).map(EntryHandle).collect(),
    };

    let mut group = c.benchmark_group("notify_encode");
    group.throughput(Throughput::Elements(256));
    group.bench_function("encode_256_handles", |b| {
        let mut scratch = BytesMut::new();
        b.iter(|| {
            let (header, payload) = black_box(&notification).encode(&mut scratch);
            black_box((header, payload))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
