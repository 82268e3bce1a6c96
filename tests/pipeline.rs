//! End-to-end encode, mux, demux and decode through the real engine

use avflow::ffi::{avcodec::codec_flag, avformat::seek_flag};
use avflow::{
  AVCodecID, AVPixelFormat, AvioContext, AvioHandlers, Codec, CodecContext, CodecError,
  CodecOptions, FormatContext, FormatMode, MediaType, OutputFormat, Rational, SyntheticVideo,
  TimeBase,
};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const FRAMES: usize = 30;
const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

fn codec_time_base() -> TimeBase {
  TimeBase::new(1, 25).unwrap()
}

fn mpeg4_encoder(global_header: bool) -> CodecContext {
  let codec = Codec::find_encoder(AVCodecID::Mpeg4).unwrap();
  let mut ctx = CodecContext::new(codec).unwrap();
  ctx.configure(&CodecOptions {
    width: Some(WIDTH),
    height: Some(HEIGHT),
    pixel_format: Some(AVPixelFormat::Yuv420p),
    bit_rate: Some(400_000),
    time_base: Some(codec_time_base()),
    frame_rate: Some(Rational::new(25, 1).unwrap()),
    gop_size: Some(12),
    max_b_frames: Some(0),
    ..Default::default()
  })
  .unwrap();
  if global_header {
    ctx.add_flags(codec_flag::GLOBAL_HEADER).unwrap();
  }
  ctx.open(&[]).unwrap();
  ctx
}

/// Encode synthetic frames into `output`, returning the payloads in write order
fn encode_into(output: &mut FormatContext, header_options: &[(&str, &str)]) -> Vec<Vec<u8>> {
  let codec = Codec::find_encoder(AVCodecID::Mpeg4).unwrap();
  let global_header = output.is_global_header();
  let stream = output.new_stream(&codec).expect("muxer accepts mpeg4");
  stream.set_codec_ctx(mpeg4_encoder(global_header));
  output.set_start_time(0).unwrap();
  output.write_header_with(header_options).unwrap();

  let stream_tb = output.stream(0).unwrap().time_base().unwrap();
  let mut payloads = Vec::new();
  let mut write_all = |output: &mut FormatContext, packets: Vec<avflow::Packet>| {
    for mut packet in packets {
      packet.set_stream_index(0);
      packet.rescale_ts(codec_time_base(), stream_tb);
      payloads.push(packet.data().to_vec());
      output.write_packet(&mut packet).unwrap();
    }
  };

  let source = SyntheticVideo::new(WIDTH, HEIGHT, AVPixelFormat::Yuv420p).unwrap();
  for frame in source.take(FRAMES) {
    let frame = frame.unwrap();
    let packets = output
      .stream_mut(0)
      .and_then(|s| s.codec_ctx_mut())
      .unwrap()
      .encode(Some(&frame))
      .unwrap();
    write_all(output, packets);
  }
  let packets = output
    .stream_mut(0)
    .and_then(|s| s.codec_ctx_mut())
    .unwrap()
    .flush_encoder()
    .unwrap();
  write_all(output, packets);

  output.close_output();
  assert!(output.last_error().is_none());
  payloads
}

fn write_mp4(path: &Path, header_options: &[(&str, &str)]) -> Vec<Vec<u8>> {
  let mut output = FormatContext::new_output(path).unwrap();
  encode_into(&mut output, header_options)
}

#[test]
fn test_encode_mux_demux_decode() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("pipeline.mp4");
  let written = write_mp4(&path, &[]);
  assert_eq!(written.len(), FRAMES);

  let mut input = FormatContext::new_input(&path.to_string_lossy()).unwrap();
  assert_eq!(input.mode(), FormatMode::Input);
  assert_eq!(input.streams_count(), 1);
  assert_eq!(input.best_stream(MediaType::Video), Some(0));

  let stream = input.stream(0).unwrap();
  assert_eq!(stream.codec_id(), AVCodecID::Mpeg4);
  assert_eq!(stream.codec_name(), "mpeg4");
  assert_eq!((stream.width(), stream.height()), (WIDTH, HEIGHT));
  assert_eq!(stream.pixel_format(), AVPixelFormat::Yuv420p);
  assert!(stream.bit_rate() > 0);
  assert_eq!((stream.sample_rate(), stream.channels()), (0, 0));
  assert!(input.bit_rate() > 0);
  assert!(input.input_format_long_name().is_some_and(|n| !n.is_empty()));

  let mut decoder = stream.decoder().unwrap();
  decoder.open(&[]).unwrap();

  let mut read = Vec::new();
  let mut decoded = 0;
  let packets: Vec<_> = input.packets().collect();
  for packet in &packets {
    read.push(packet.data().to_vec());
    decoded += decoder.decode(Some(packet)).unwrap().len();
  }
  decoded += decoder.flush_decoder().unwrap().len();

  // Exactly the packets written, in write order
  assert_eq!(read, written);
  assert!(packets.windows(2).all(|w| w[0].dts() <= w[1].dts()));
  assert_eq!(decoded, FRAMES);
  assert!(input.last_error().is_none());

  input.close_input();
  input.close_input();
  assert_eq!(input.mode(), FormatMode::Closed);
}

#[test]
fn test_decoded_frames_keep_geometry() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("geometry.mp4");
  write_mp4(&path, &[]);

  let mut input = FormatContext::new_input(&path.to_string_lossy()).unwrap();
  let mut decoder = input.stream(0).unwrap().decoder().unwrap();
  decoder.open(&[]).unwrap();

  let mut frames = Vec::new();
  let packets: Vec<_> = input.packets().collect();
  for packet in &packets {
    frames.extend(decoder.decode(Some(packet)).unwrap());
  }
  frames.extend(decoder.flush_decoder().unwrap());

  let first = frames.first().unwrap();
  assert_eq!((first.width(), first.height()), (WIDTH, HEIGHT));
  assert_eq!(first.pixel_format(), AVPixelFormat::Yuv420p);
  assert!(first.is_key_frame());
}

#[test]
fn test_early_break_then_close() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("break.mp4");
  write_mp4(&path, &[]);

  let mut input = FormatContext::new_input(&path.to_string_lossy()).unwrap();
  let first = input.packets().next().unwrap();
  assert!(first.size() > 0);

  input.close_input();
  assert!(input.packets().next().is_none());
  assert!(input.last_error().is_none());
}

#[test]
fn test_custom_seekable_input() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("seekable.mp4");
  let written = write_mp4(&path, &[]);
  let bytes = std::fs::read(&path).unwrap();

  let mut input = FormatContext::new().unwrap();
  input
    .set_input_format("mov")
    .unwrap()
    .set_pb(AvioContext::from_seekable_reader(Cursor::new(bytes)).unwrap())
    .unwrap();
  input.open_input("").unwrap();

  let read: Vec<Vec<u8>> = input.packets().map(|p| p.data().to_vec()).collect();
  assert_eq!(read, written);
  assert!(input.last_error().is_none());
}

#[test]
fn test_read_error_ends_packets_and_is_kept() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("failing.mp4");
  write_mp4(&path, &[]);
  let source = Arc::new(Mutex::new(Cursor::new(std::fs::read(&path).unwrap())));
  let refuse_seeks = Arc::new(AtomicBool::new(false));

  let reader = source.clone();
  let refuse = refuse_seeks.clone();
  let handlers = AvioHandlers::reader(move |buf| reader.lock().unwrap().read(buf).unwrap_or(0))
    .with_seek(move |pos| {
      if refuse.load(Ordering::SeqCst) {
        return None;
      }
      source.lock().unwrap().seek(pos).ok()
    })
    // Small enough that going back to the first sample needs a real seek
    .with_buffer_size(256);

  let mut input = FormatContext::new().unwrap();
  input.set_input_format("mov").unwrap();
  input.set_pb(AvioContext::new(handlers).unwrap()).unwrap();
  input.open_input("").unwrap();
  for _ in 0..5 {
    assert!(input.read_packet().unwrap().is_some());
  }

  // The sample index lives in memory, so seeking works; fetching the data does not
  refuse_seeks.store(true, Ordering::SeqCst);
  input.seek(Some(0), 0, seek_flag::BACKWARD).unwrap();
  assert!(matches!(input.read_packet(), Err(CodecError::Read(_))));

  assert!(input.packets().next().is_none());
  assert!(matches!(input.last_error(), Some(CodecError::Read(_))));
  assert!(matches!(input.take_last_error(), Some(CodecError::Read(_))));
  assert!(input.last_error().is_none());
}

#[test]
fn test_custom_reader_on_faststart_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("faststart.mp4");
  let written = write_mp4(&path, &[("movflags", "faststart")]);
  let file = std::fs::File::open(&path).unwrap();

  // Sequential reads only: the index must come before the media data
  let mut input = FormatContext::new().unwrap();
  input.set_input_format("mov").unwrap();
  input.set_pb(AvioContext::from_reader(file).unwrap()).unwrap();
  input.open_input("").unwrap();

  let count = input.packets().count();
  assert_eq!(count, written.len());
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

#[test]
fn test_custom_output_round_trip() {
  let sink = SharedSink::default();
  let mut output = FormatContext::new_output(OutputFormat::from_name("mpegts").unwrap()).unwrap();
  assert!(!output.is_global_header());
  output
    .set_pb(AvioContext::from_writer(sink.clone()).unwrap())
    .unwrap();
  let written = encode_into(&mut output, &[]);
  assert_eq!(written.len(), FRAMES);

  let bytes = sink.0.lock().unwrap().clone();
  assert!(!bytes.is_empty());
  // Transport stream packets are 188 bytes with a 0x47 sync byte
  assert_eq!(bytes.len() % 188, 0);
  assert_eq!(bytes[0], 0x47);

  let mut input = FormatContext::new().unwrap();
  input.set_input_format("mpegts").unwrap();
  input
    .set_pb(AvioContext::from_reader(Cursor::new(bytes)).unwrap())
    .unwrap();
  input.open_input("").unwrap();
  assert_eq!(input.stream(0).unwrap().codec_id(), AVCodecID::Mpeg4);
  assert!(input.packets().count() > 0);
}

#[test]
fn test_output_without_io_fails_header() {
  let mut output = FormatContext::new_output(OutputFormat::from_name("mp4").unwrap()).unwrap();
  let codec = Codec::find_encoder(AVCodecID::Mpeg4).unwrap();
  let global_header = output.is_global_header();
  output
    .new_stream(&codec)
    .unwrap()
    .set_codec_ctx(mpeg4_encoder(global_header));
  assert!(matches!(output.write_header(), Err(CodecError::HeaderWrite(_))));
  output.close_output();
}

#[test]
fn test_stream_copy_remux() {
  let dir = tempfile::tempdir().unwrap();
  let source_path = dir.path().join("source.mp4");
  let written = write_mp4(&source_path, &[]);

  let mut input = FormatContext::new_input(&source_path.to_string_lossy()).unwrap();
  let target_path = dir.path().join("copy.mkv");
  let mut output = FormatContext::new_output(target_path.as_path()).unwrap();
  output.new_stream_copy(input.stream(0).unwrap()).unwrap();
  output.write_header().unwrap();

  let in_tb = input.stream(0).unwrap().time_base().unwrap();
  let out_tb = output.stream(0).unwrap().time_base().unwrap();
  let packets: Vec<_> = input.packets().collect();
  for mut packet in packets {
    packet.rescale_ts(in_tb, out_tb);
    packet.set_stream_index(0);
    output.write_packet(&mut packet).unwrap();
  }
  output.close_output();
  assert!(output.last_error().is_none());

  let mut copy = FormatContext::new_input(&target_path.to_string_lossy()).unwrap();
  assert_eq!(copy.input_format_name(), Some("matroska,webm"));
  let read: Vec<Vec<u8>> = copy.packets().map(|p| p.data().to_vec()).collect();
  assert_eq!(read, written);
}
