use criterion::{criterion_group, criterion_main, Criterion};
use webrtc_util::marshal::Marshal;

fn rtp_packet(payload_len: usize) -> Vec<u8> {
    let header = rtp::header::Header {
        version: 2,
        payload_type: 100,
        sequence_number: 1,
        timestamp: 0xDEADBEEF,
        ssrc: 0xCAFEBABE,
        ..Default::default()
    };
    let mut out = header.marshal().unwrap();
    out.extend(std::iter::repeat(0u8).take(payload_len));
    out
}

fn bench_aes_cm(c: &mut Criterion) {
    let profile = srtp_core::profile::AES128_CM_HMAC_SHA1_80;
    let mut ctx = srtp_core::context::SrtpContext::new(
        profile,
        vec![0x0Bu8; 16],
        vec![0x0Eu8; 14],
        None,
        true,
    )
    .unwrap();
    let packet = rtp_packet(1200);
    c.bench_function("protect_rtp/aes128_cm", |b| {
        b.iter(|| ctx.protect_rtp(&packet).unwrap())
    });
}

fn bench_aead_gcm(c: &mut Criterion) {
    let profile = srtp_core::profile::AEAD_AES_128_GCM;
    let mut ctx = srtp_core::context::SrtpContext::new(
        profile,
        vec![0x0Bu8; 16],
        vec![0x0Eu8; 12],
        None,
        true,
    )
    .unwrap();
    let packet = rtp_packet(1200);
    c.bench_function("protect_rtp/aead_aes_128_gcm", |b| {
        b.iter(|| ctx.protect_rtp(&packet).unwrap())
    });
}

fn bench_double_aead(c: &mut Criterion) {
    let profile = srtp_core::profile::DOUBLE_AEAD_AES_128_GCM_AEAD_AES_128_GCM;
    let mut ctx = srtp_core::context::SrtpContext::new(
        profile,
        vec![0x0Bu8; 32],
        vec![0x0Eu8; 24],
        None,
        true,
    )
    .unwrap();
    let packet = rtp_packet(1200);
    c.bench_function("protect_rtp/double_aead_128", |b| {
        b.iter(|| ctx.protect_rtp(&packet).unwrap())
    });
}

criterion_group!(benches, bench_aes_cm, bench_aead_gcm, bench_double_aead);
criterion_main!(benches);
