use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::error::Error;
use crate::filter::{Filter, FilterChain, LzmaOverrides, Preset};

fn sample_text() -> Vec<u8> {
    "hello world ".repeat(1000).into_bytes()
}

/// Deterministic incompressible bytes, no RNG dependency needed.
fn pseudo_random(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.extend_from_slice(&state.to_le_bytes());
    }
    data.truncate(len);
    data
}

fn lzma2_chain() -> FilterChain {
    FilterChain::lzma2_default().unwrap()
}

fn xz_compress(data: &[u8], check: CheckKind) -> Vec<u8> {
    let mut engine = CodecEngine::encoder(lzma2_chain(), check).unwrap();
    let mut out = engine.transform(data, Action::Finish).unwrap();
    out.extend(engine.finish().unwrap());
    out
}

fn xz_decompress(data: &[u8]) -> Vec<u8> {
    let mut engine = CodecEngine::decoder(&DecoderOptions::default()).unwrap();
    engine.transform(data, Action::Finish).unwrap()
}

#[test]
fn round_trip_each_check() {
    let payload = sample_text();
    for check in [
        CheckKind::None,
        CheckKind::Crc32,
        CheckKind::Crc64,
        CheckKind::Sha256,
    ] {
        let compressed = xz_compress(&payload, check);
        assert!(compressed.len() < payload.len(), "{check:?} did not compress");
        assert_eq!(xz_decompress(&compressed), payload, "{check:?} round trip");
    }
}

/// Incremental updates followed by finish must produce the same stream a
/// decoder accepts, with no bytes lost between calls.
#[test]
fn incremental_updates_round_trip() {
    let payload = sample_text();
    let mut engine = CodecEngine::encoder(lzma2_chain(), CheckKind::Crc32).unwrap();

    let mut compressed = Vec::new();
    for chunk in payload.chunks(997) {
        compressed.extend(engine.update(chunk).unwrap());
    }
    compressed.extend(engine.finish().unwrap());

    assert_eq!(xz_decompress(&compressed), payload);
}

/// A payload larger than the scratch buffer forces the transform loop
/// through multiple drain iterations.
#[test]
fn large_incompressible_payload_round_trips() {
    let payload = pseudo_random(1 << 20);
    let mut engine = EngineBuilder::new()
        .scratch_capacity(64 * 1024)
        .encoder(lzma2_chain(), CheckKind::Crc64)
        .unwrap();
    let compressed = engine.transform(&payload, Action::Finish).unwrap();
    // Incompressible input grows slightly but stays within the bound.
    assert!(compressed.len() <= crate::util::stream_buffer_bound(payload.len()));
    assert_eq!(xz_decompress(&compressed), payload);
}

/// Headerless LZMA1 coding with custom literal context settings; the
/// decoding side must be configured with the identical chain.
#[test]
fn raw_lzma1_round_trip() {
    let overrides = LzmaOverrides {
        lc: Some(0),
        lp: Some(2),
        pb: Some(2),
        ..LzmaOverrides::default()
    };
    let chain = FilterChain::build(vec![
        Filter::lzma1(Preset::new(9).unwrap(), &overrides).unwrap(),
    ])
    .unwrap();
    let payload = pseudo_random(1 << 20);

    let mut encoder = CodecEngine::raw_encoder(chain.clone()).unwrap();
    let compressed = encoder.transform(&payload, Action::Finish).unwrap();

    let mut decoder = CodecEngine::raw_decoder(chain).unwrap();
    let decoded = decoder.transform(&compressed, Action::Finish).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn delta_then_lzma2_round_trip() {
    let chain = FilterChain::build(vec![
        Filter::delta(4),
        Filter::lzma2(Preset::default(), &LzmaOverrides::default()).unwrap(),
    ])
    .unwrap();

    // Delta-friendly input: slowly varying 4-byte records.
    let mut payload = Vec::with_capacity(64 * 1024);
    for i in 0u32..16 * 1024 {
        payload.extend_from_slice(&(i / 3).to_le_bytes());
    }

    let mut encoder = CodecEngine::encoder(chain, CheckKind::default()).unwrap();
    let compressed = encoder.transform(&payload, Action::Finish).unwrap();
    assert_eq!(xz_decompress(&compressed), payload);
}

#[test]
fn empty_payload_round_trips() {
    let compressed = xz_compress(&[], CheckKind::Crc64);
    assert!(!compressed.is_empty(), "container framing must be emitted");
    assert_eq!(xz_decompress(&compressed), Vec::<u8>::new());
}

#[test]
fn empty_chain_is_rejected() {
    let chain = FilterChain::build(Vec::new()).unwrap();
    assert!(matches!(
        CodecEngine::encoder(chain.clone(), CheckKind::default()),
        Err(Error::OptionsError)
    ));
    assert!(matches!(
        CodecEngine::raw_encoder(chain),
        Err(Error::OptionsError)
    ));
}

/// The low-level primitive drains consumed bytes from the source and caps
/// the destination, leaving the remainder for later calls.
#[test]
fn code_consumes_source_incrementally() {
    let payload = pseudo_random(8 * 1024);
    let compressed = xz_compress(&payload, CheckKind::Crc32);

    let mut decoder = CodecEngine::decoder(&DecoderOptions::default()).unwrap();
    let mut src = compressed.clone();
    let mut dest = Vec::new();
    let mut decoded = Vec::new();
    let mut first = true;

    loop {
        let status = decoder.code(&mut src, &mut dest, 64, Action::Finish);
        assert!(dest.len() <= 64, "destination cap exceeded");
        decoded.extend_from_slice(&dest);
        if first {
            // Incompressible data cannot fit through a 64-byte window in
            // one step, so input must remain.
            assert!(!src.is_empty());
            first = false;
        }
        match status {
            Status::StreamEnd => break,
            Status::Ok => {}
            other => panic!("unexpected status {other:?}"),
        }
    }

    assert!(src.is_empty());
    assert!(decoder.stream_ended());
    assert_eq!(decoded, payload);
}

/// Running the primitive without a flush action must also consume the
/// source a prefix at a time; the final finish step only closes the
/// stream.
#[test]
fn code_run_action_consumes_source_incrementally() {
    let payload = pseudo_random(8 * 1024);
    let compressed = xz_compress(&payload, CheckKind::Crc64);

    let mut decoder = CodecEngine::decoder(&DecoderOptions::default()).unwrap();
    let mut src = compressed.clone();
    let mut dest = Vec::new();
    let mut decoded = Vec::new();
    let mut ended = false;
    let mut first = true;

    while !src.is_empty() {
        let status = decoder.code(&mut src, &mut dest, 64, Action::Run);
        assert!(dest.len() <= 64, "destination cap exceeded");
        decoded.extend_from_slice(&dest);
        if first {
            assert!(!src.is_empty(), "one small step must leave input over");
            first = false;
        }
        match status {
            Status::Ok => {}
            Status::StreamEnd => {
                ended = true;
                break;
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    while !ended {
        let status = decoder.code(&mut src, &mut dest, 64, Action::Finish);
        decoded.extend_from_slice(&dest);
        match status {
            Status::Ok => {}
            Status::StreamEnd => ended = true,
            other => panic!("unexpected status {other:?}"),
        }
    }

    assert!(decoder.stream_ended());
    assert_eq!(decoded, payload);
}

#[test]
fn code_rejects_released_engine() {
    let mut engine = CodecEngine::encoder(lzma2_chain(), CheckKind::default()).unwrap();
    engine.finish().unwrap();

    let mut src = b"data".to_vec();
    let mut dest = Vec::new();
    assert_eq!(
        engine.code(&mut src, &mut dest, 64, Action::Run),
        Status::ProgError
    );
    assert_eq!(src, b"data");
}

/// A tiny memory limit must fail decoding with the dedicated error, and
/// the failure is terminal for the engine instance.
#[test]
fn decoder_memlimit_is_enforced() {
    let compressed = xz_compress(&sample_text(), CheckKind::Crc64);

    let options = DecoderOptions::new().memlimit(1);
    let mut decoder = CodecEngine::decoder(&options).unwrap();
    assert_eq!(
        decoder.transform(&compressed, Action::Finish),
        Err(Error::MemlimitError)
    );
    assert!(decoder.is_errored());
    assert_eq!(decoder.update(&compressed), Err(Error::ProgError));
}

#[test]
fn corrupt_input_fails_then_fast_fails() {
    let mut decoder = CodecEngine::decoder(&DecoderOptions::default()).unwrap();
    let garbage = b"definitely not an xz container".to_vec();

    let err = decoder.transform(&garbage, Action::Finish).unwrap_err();
    assert!(
        matches!(err, Error::FormatError | Error::DataError),
        "got {err:?}"
    );
    assert!(decoder.is_errored());
    assert_eq!(decoder.update(b"more"), Err(Error::ProgError));
}

#[test]
fn finish_releases_the_engine() {
    let mut engine = CodecEngine::encoder(lzma2_chain(), CheckKind::default()).unwrap();
    engine.update(b"payload").unwrap();
    engine.finish().unwrap();

    assert_eq!(engine.update(b"more"), Err(Error::NotInitialized));
    assert_eq!(engine.flush(false), Err(Error::NotInitialized));
    assert_eq!(engine.memusage(), None);
}

/// After a sync flush every byte fed so far must be decodable from the
/// output emitted so far.
#[test]
fn sync_flush_exposes_pending_bytes() {
    let mut encoder = CodecEngine::encoder(lzma2_chain(), CheckKind::Crc32).unwrap();
    let mut compressed = encoder.update(b"first chunk").unwrap();
    compressed.extend(encoder.flush(false).unwrap());

    let mut decoder = CodecEngine::decoder(&DecoderOptions::default()).unwrap();
    let decoded = decoder.update(&compressed).unwrap();
    assert_eq!(decoded, b"first chunk");

    // The stream stays open: more input plus finish still round-trips.
    compressed.extend(encoder.update(b" second chunk").unwrap());
    compressed.extend(encoder.finish().unwrap());
    assert_eq!(xz_decompress(&compressed), b"first chunk second chunk");
}

/// A full flush closes the current block; the stream must still decode as
/// one payload afterwards.
#[test]
fn full_flush_keeps_the_stream_valid() {
    let mut encoder = CodecEngine::encoder(lzma2_chain(), CheckKind::Crc64).unwrap();
    let mut compressed = encoder.update(&sample_text()).unwrap();
    compressed.extend(encoder.flush(true).unwrap());
    compressed.extend(encoder.update(b"tail").unwrap());
    compressed.extend(encoder.finish().unwrap());

    let mut expected = sample_text();
    expected.extend_from_slice(b"tail");
    assert_eq!(xz_decompress(&compressed), expected);
}

#[test]
fn no_check_stream_reports_notice() {
    let compressed = xz_compress(b"unchecked payload", CheckKind::None);

    let options = DecoderOptions::new().flags(DecoderFlags::TELL_NO_CHECK);
    let mut decoder = CodecEngine::decoder(&options).unwrap();
    let decoded = decoder.transform(&compressed, Action::Finish).unwrap();

    assert_eq!(decoded, b"unchecked payload");
    assert_eq!(decoder.take_notice(), Some(Notice::NoCheck));
    assert_eq!(decoder.take_notice(), None);
}

#[test]
fn check_kind_is_reported_once_known() {
    let compressed = xz_compress(b"checked payload", CheckKind::Crc32);

    let options = DecoderOptions::new().flags(DecoderFlags::TELL_ANY_CHECK);
    let mut decoder = CodecEngine::decoder(&options).unwrap();
    let decoded = decoder.transform(&compressed, Action::Finish).unwrap();

    assert_eq!(decoded, b"checked payload");
    assert_eq!(decoder.take_notice(), Some(Notice::CheckKnown));
    assert_eq!(decoder.check_kind(), Some(CheckKind::Crc32));
}

#[test]
fn auto_decoder_handles_xz_input() {
    let payload = sample_text();
    let compressed = xz_compress(&payload, CheckKind::Crc64);

    let mut decoder = CodecEngine::auto_decoder(&DecoderOptions::default()).unwrap();
    assert_eq!(decoder.transform(&compressed, Action::Finish).unwrap(), payload);
    assert!(decoder.stream_ended());
}

/// Without the concatenated flag the decoder stops at the first stream's
/// end; with it, back-to-back streams decode as one payload.
#[test]
fn concatenated_streams_decode_as_one() {
    let mut both = xz_compress(b"first|", CheckKind::Crc32);
    both.extend(xz_compress(b"second", CheckKind::Crc32));

    let options = DecoderOptions::new().flags(DecoderFlags::CONCATENATED);
    let mut decoder = CodecEngine::decoder(&options).unwrap();
    let decoded = decoder.transform(&both, Action::Finish).unwrap();
    assert_eq!(decoded, b"first|second");

    let mut single = CodecEngine::decoder(&DecoderOptions::default()).unwrap();
    let decoded = single.update(&both).unwrap();
    assert_eq!(decoded, b"first|");
    assert!(single.stream_ended());
}

#[test]
fn interrupt_flag_aborts_the_transform() {
    let flag = Arc::new(AtomicBool::new(true));
    let mut engine = EngineBuilder::new()
        .interrupt_flag(Arc::clone(&flag))
        .encoder(lzma2_chain(), CheckKind::default())
        .unwrap();

    assert_eq!(engine.update(b"payload"), Err(Error::Interrupted));
    assert!(engine.is_errored());
    assert_eq!(engine.update(b"again"), Err(Error::ProgError));
}

#[test]
fn unset_interrupt_flag_is_harmless() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut engine = EngineBuilder::new()
        .interrupt_flag(flag)
        .encoder(lzma2_chain(), CheckKind::Crc32)
        .unwrap();
    let mut compressed = engine.transform(&sample_text(), Action::Finish).unwrap();
    compressed.extend(engine.finish().unwrap());
    assert_eq!(xz_decompress(&compressed), sample_text());
}

#[test]
fn reclaim_hook_is_not_invoked_on_success() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invocations);
    let engine = EngineBuilder::new()
        .reclaim_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .encoder(lzma2_chain(), CheckKind::default())
        .unwrap();
    drop(engine);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

/// Undersized scratch requests are clamped, not rejected.
#[test]
fn scratch_capacity_is_clamped() {
    let payload = sample_text();
    let mut engine = EngineBuilder::new()
        .scratch_capacity(1)
        .encoder(lzma2_chain(), CheckKind::Crc32)
        .unwrap();
    let compressed = engine.transform(&payload, Action::Finish).unwrap();
    assert_eq!(xz_decompress(&compressed), payload);
}

#[test]
fn totals_track_progress() {
    let payload = sample_text();
    let mut engine = CodecEngine::encoder(lzma2_chain(), CheckKind::Crc64).unwrap();
    let compressed = engine.transform(&payload, Action::Finish).unwrap();

    assert_eq!(engine.total_in(), payload.len() as u64);
    assert_eq!(engine.total_out(), compressed.len() as u64);
    assert!(engine.memusage().unwrap_or(0) > 0);
}
