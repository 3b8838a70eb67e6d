//! Message codec benchmarks.
//!
//! Every datagram the agent serves goes through one full decode and one
//! full encode, so these measure the whole framing path rather than
//! individual BER primitives.

use std::hint::black_box;
use std::net::SocketAddr;

use async_snmp_agent::message::CommunityMessage;
use async_snmp_agent::oid::Oid;
use async_snmp_agent::pdu::{GenericTrap, Pdu, PduType, TrapV1Pdu};
use async_snmp_agent::value::Value;
use async_snmp_agent::varbind::{VarBind, VarBindBuffer};
use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn peer() -> SocketAddr {
    "192.0.2.1:161".parse().unwrap()
}

fn response_varbinds(count: u32) -> Vec<VarBind> {
    (0..count)
        .map(|i| {
            VarBind::new(
                Oid::from_slice(&[1, 3, 6, 1, 4, 1, 46410, 2, 1, i]),
                match i % 3 {
                    0 => Value::Integer(i as i32),
                    1 => Value::Counter32(1_000_000 + i),
                    _ => Value::OctetString(Bytes::from(format!("sensor-{i}"))),
                },
            )
        })
        .collect()
}

/// Encode a GET response at typical and GET-BULK-sized varbind counts.
fn bench_message_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_encode");

    for count in [1u32, 3, 10, 25] {
        let request = Pdu::request(
            PduType::GetRequest,
            12345,
            vec![VarBind::null(Oid::from_slice(&[1, 3, 6, 1, 4, 1, 46410, 0]))],
        );
        let pdu = request.to_response(response_varbinds(count));
        let msg = CommunityMessage::v2c(Bytes::from_static(b"public"), pdu);

        group.bench_with_input(BenchmarkId::new("v2c_response", count), &msg, |b, msg| {
            b.iter(|| black_box(msg.encode()))
        });
    }

    group.finish();
}

fn bench_message_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_decode");

    for count in [1u32, 3, 10, 25] {
        let pdu = Pdu::request(
            PduType::GetRequest,
            12345,
            response_varbinds(count)
                .into_iter()
                .map(|vb| VarBind::null(vb.oid))
                .collect(),
        );
        let encoded = CommunityMessage::v2c(Bytes::from_static(b"public"), pdu).encode();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("v2c_request", count),
            &encoded,
            |b, data| {
                b.iter(|| black_box(CommunityMessage::decode(data.clone(), peer()).unwrap()))
            },
        );
    }

    group.finish();
}

/// The two-pass trap framing: measure the size, then emit.
fn bench_trap_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("trap_encode");

    let trap = TrapV1Pdu::new(
        Oid::from_slice(&[1, 3, 6, 1, 4, 1, 46410]),
        [192, 0, 2, 7],
        GenericTrap::EnterpriseSpecific,
        3,
        123_456,
        response_varbinds(2),
    );
    group.bench_function("v1_trap", |b| {
        b.iter(|| {
            black_box(CommunityMessage::encode_trap_v1(
                Bytes::from_static(b"public"),
                &trap,
            ))
        })
    });

    let pdu = Pdu::notification(
        PduType::TrapV2,
        42,
        123_456,
        Oid::from_slice(&[1, 3, 6, 1, 6, 3, 1, 1, 5, 3]),
        response_varbinds(2),
    );
    let msg = CommunityMessage::v2c(Bytes::from_static(b"public"), pdu);
    group.bench_function("v2c_trap", |b| b.iter(|| black_box(msg.encode())));

    group.finish();
}

/// Budgeted varbind accumulation, the GET-BULK response path.
fn bench_varbind_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("varbind_buffer");

    let varbinds = response_varbinds(50);

    for budget in [256usize, 1372] {
        group.bench_with_input(
            BenchmarkId::new("fill", budget),
            &varbinds,
            |b, varbinds| {
                b.iter(|| {
                    let mut buffer = VarBindBuffer::new(budget);
                    for vb in varbinds {
                        if buffer.push(vb.clone()).is_err() {
                            break;
                        }
                    }
                    black_box(buffer.into_varbinds())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_message_encode,
    bench_message_decode,
    bench_trap_encode,
    bench_varbind_buffer,
);

criterion_main!(benches);
