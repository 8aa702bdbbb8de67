//! Benchmark: compile vs pack vs unpack for a mixed-endianness format, and
//! compiled-codec reuse vs the one-shot free functions.

use bitstruct::{byteswap, pack, unpack, values, Codec, Format};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const MIXED: &str = "u1u1<s14<u17>u9<f32r43p5b3";

fn bench_pack_unpack(c: &mut Criterion) {
    let data = values![0, 1, -2, 65, 22, 3.14159, b"\x00\xff\x00\xff\x00\xff", true];
    let codec = Codec::compile(MIXED).expect("compile");
    let packed = codec.pack(&data).expect("pack");

    c.bench_function("compile_mixed", |b| {
        b.iter(|| Format::compile(black_box(MIXED)).expect("compile"))
    });

    c.bench_function("pack_mixed_codec", |b| {
        b.iter(|| codec.pack(black_box(&data)).expect("pack"))
    });

    c.bench_function("unpack_mixed_codec", |b| {
        b.iter(|| codec.unpack(black_box(&packed)).expect("unpack"))
    });

    c.bench_function("pack_unpack_mixed_oneshot", |b| {
        b.iter(|| {
            let p = pack(MIXED, black_box(&data)).expect("pack");
            unpack(MIXED, &p).expect("unpack")
        })
    });

    let wide = Codec::compile("<u77s200").expect("compile");
    let wide_data = values![0x100000000001000000u128, -2];
    c.bench_function("pack_unpack_wide", |b| {
        b.iter(|| {
            let p = wide.pack(black_box(&wide_data)).expect("pack");
            wide.unpack(&p).expect("unpack")
        })
    });

    let mut buf = vec![0u8; 4096];
    c.bench_function("byteswap_4k_words", |b| {
        b.iter(|| {
            for offset in (0..buf.len()).step_by(4) {
                byteswap("4", black_box(&mut buf), offset).expect("byteswap");
            }
        })
    });
}

criterion_group!(benches, bench_pack_unpack);
criterion_main!(benches);
