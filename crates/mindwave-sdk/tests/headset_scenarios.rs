//! 端到端场景测试
//!
//! 通过进程内通道传输向 `Headset` 喂入字节流，验证：
//! 1. 有效数据包更新最新值并触发观察者
//! 2. 垃圾前缀、校验失败、格式错误的数据包被丢弃，之后的数据包正常处理
//! 3. logging 开关控制历史增长，并可导出为录制文件

use mindwave_sdk::driver::ChannelObserver;
use mindwave_sdk::protocol::{PayloadBuilder, encode_packet};
use mindwave_sdk::transport::{ChannelFeeder, channel};
use mindwave_sdk::{
    EegRecording, Headset, HeadsetBuilder, SensorField, SensorKind, recording_from_history,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn running_headset() -> (ChannelFeeder, Headset) {
    let (feeder, opener) = channel(None);
    let headset = HeadsetBuilder::new().transport(opener).build().unwrap();
    headset.start().unwrap();
    (feeder, headset)
}

fn raw_packet(value: i16) -> Vec<u8> {
    PayloadBuilder::new()
        .field(SensorField::RawValue(value))
        .packet()
}

#[test]
fn test_poor_signal_packet_updates_state_and_observer() {
    let (feeder, headset) = running_headset();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    headset.set_callback(SensorKind::PoorSignal, move |field: SensorField| {
        s.lock().unwrap().push(field.value());
    });

    feeder.send(vec![0xAA, 0xAA, 0x02, 0x02, 0xC8, 0x35]).unwrap();

    assert!(wait_until(Duration::from_secs(2), || headset.poor_signal() == 200));
    assert!(wait_until(Duration::from_secs(2), || seen.lock().unwrap().len() == 1));
    assert_eq!(*seen.lock().unwrap(), vec![200]);
    assert_eq!(headset.latest(SensorKind::PoorSignal), SensorField::PoorSignal(200));

    headset.stop().unwrap();
}

#[test]
fn test_corrupt_packet_is_skipped_and_scanning_resumes() {
    let (feeder, headset) = running_headset();

    // 校验和错误的数据包，后跟一个杂散字节，再跟一个有效数据包
    feeder.send(vec![0xAA, 0xAA, 0x02, 0x80, 0x02, 0x81, 0xCC]).unwrap();
    feeder.send(vec![0xAA, 0xAA, 0x02, 0x02, 0xC8, 0x35]).unwrap();

    assert!(wait_until(Duration::from_secs(2), || headset.poor_signal() == 200));
    assert!(headset.is_running());

    let metrics = headset.metrics();
    assert_eq!(metrics.checksum_mismatches, 1);
    assert_eq!(metrics.packets_valid, 1);
    assert_eq!(metrics.bytes_discarded, 1);
    assert_eq!(headset.raw_value(), 0);

    headset.stop().unwrap();
}

#[test]
fn test_malformed_packet_with_valid_checksum_is_discarded() {
    let (feeder, headset) = running_headset();

    // 0x80 声明 2 字节数值，但负载中已无剩余字节
    feeder.send(encode_packet(&[0x80, 0x02])).unwrap();
    feeder.send(encode_packet(&[0x16, 0x30])).unwrap();

    assert!(wait_until(Duration::from_secs(2), || headset.blink_strength() == 0x30));
    assert_eq!(headset.metrics().malformed_packets, 1);
    assert_eq!(headset.raw_value(), 0);

    headset.stop().unwrap();
}

#[test]
fn test_garbage_prefix_is_skipped() {
    let (feeder, headset) = running_headset();

    let mut stream = vec![0x00, 0x13, 0xAA, 0x37, 0xFF];
    stream.extend(raw_packet(1234));
    feeder.send(stream).unwrap();

    assert!(wait_until(Duration::from_secs(2), || headset.raw_value() == 1234));
    assert_eq!(headset.metrics().bytes_discarded, 5);

    headset.stop().unwrap();
}

#[test]
fn test_multi_field_packet_applies_every_field() {
    let (feeder, headset) = running_headset();

    let packet = PayloadBuilder::new()
        .field(SensorField::PoorSignal(0))
        .field(SensorField::Attention(61))
        .field(SensorField::Meditation(47))
        .field(SensorField::RawValue(-32768))
        .packet();
    feeder.send(packet).unwrap();

    assert!(wait_until(Duration::from_secs(2), || headset.raw_value() == -32768));
    let readings = headset.readings();
    assert_eq!(readings.poor_signal, 0);
    assert_eq!(readings.attention, 61);
    assert_eq!(readings.meditation, 47);
    assert_eq!(readings.updates, 4);

    headset.stop().unwrap();
}

#[test]
fn test_history_grows_only_while_logging() {
    let (feeder, headset) = running_headset();

    // logging 关闭：不记录
    for v in 0..10 {
        feeder.send(raw_packet(v)).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || headset.raw_value() == 9));
    assert!(headset.export_history().raw_history.is_empty());

    headset.set_logging(true);
    for v in [100, -100, 200, -200, 300] {
        feeder.send(raw_packet(v)).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || {
        headset.export_history().raw_history.len() == 5
    }));
    assert_eq!(
        headset.export_history().raw_history,
        vec![100, -100, 200, -200, 300]
    );

    headset.set_logging(false);
    feeder.send(raw_packet(7)).unwrap();
    assert!(wait_until(Duration::from_secs(2), || headset.raw_value() == 7));
    assert_eq!(headset.export_history().raw_history.len(), 5);

    headset.stop().unwrap();
}

#[test]
fn test_disabling_logging_twice_keeps_end_time() {
    let (_feeder, opener) = channel(None);
    let headset = Headset::new(opener, Default::default());

    headset.set_logging(true);
    headset.set_logging(false);
    let stopped = headset.export_history().logging_stopped_at;
    assert!(stopped.is_some());

    thread::sleep(Duration::from_millis(5));
    headset.set_logging(false);
    assert_eq!(headset.export_history().logging_stopped_at, stopped);
}

#[test]
fn test_stimulus_marks_align_with_samples() {
    let (feeder, headset) = running_headset();
    assert!(!headset.record_stimulus(1));

    headset.set_logging(true);
    for v in [1, 2, 3] {
        feeder.send(raw_packet(v)).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || {
        headset.export_history().raw_history.len() == 3
    }));
    assert!(headset.record_stimulus(8));
    feeder.send(raw_packet(4)).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        headset.export_history().raw_history.len() == 4
    }));
    headset.stop().unwrap();

    let history = headset.export_history();
    assert_eq!(history.stimulus_log.len(), 1);
    assert_eq!(history.stimulus_log[0].sample_index, 3);

    let recording = recording_from_history(&history, &headset.transport());
    assert_eq!(recording.metadata.source, "channel");
    assert_eq!(recording.stimulus_channel(), vec![0, 0, 0, 8]);

    let file = tempfile::NamedTempFile::new().unwrap();
    recording.save(file.path()).unwrap();
    assert_eq!(EegRecording::load(file.path()).unwrap(), recording);

    headset.clear_history();
    assert!(headset.export_history().raw_history.is_empty());
    assert!(headset.is_logging());
}

#[test]
fn test_channel_observer_receives_updates_in_order() {
    let (feeder, headset) = running_headset();
    let (observer, rx) = ChannelObserver::new(64);
    headset.set_callback(SensorKind::RawValue, observer);

    for v in [5, 6, 7, 8] {
        feeder.send(raw_packet(v)).unwrap();
    }

    let values: Vec<i32> = (0..4)
        .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap().field.value())
        .collect();
    assert_eq!(values, vec![5, 6, 7, 8]);

    headset.stop().unwrap();
}

#[test]
fn test_observer_count_matches_updates() {
    let (feeder, headset) = running_headset();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    headset.set_callback(SensorKind::BlinkStrength, move |_: SensorField| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    for v in 0..50u8 {
        feeder.send(encode_packet(&[0x16, v])).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || {
        calls.load(Ordering::SeqCst) == 50
    }));
    assert_eq!(headset.metrics().fields_decoded, 50);
    assert_eq!(headset.blink_strength(), 49);

    headset.stop().unwrap();
}
