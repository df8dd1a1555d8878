use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use panelcfg_device::{
    ClockConfig, ClockSettings, Command, Device, DeviceError, DisplayTiming, EncoderSnapshot, Message,
};
use panelcfg_frame::{
    build_command, FrameReader, CLOCK_CONFIG, ENCODER_CONFIG, FRAME_SIZE, PUSH_CLOCK_CONFIG,
    TIMING_CONFIG,
};
use panelcfg_regs::{split, RegisterMap};
use panelcfg_transport::{loopback, ByteSink, ByteSource};

#[test]
fn outbound_and_inbound_tag_spaces_are_independent() {
    // A command echoed back verbatim keeps its command tag; it never turns
    // into the matching data message.
    let (sink, mut source) = loopback();
    let mut host = Device::new(sink);

    let mut payload = split(25_000_000, 4).unwrap();
    payload.extend(split(25, 4).unwrap());
    payload.extend(split(192, 4).unwrap());
    let wire = build_command(PUSH_CLOCK_CONFIG, &payload).unwrap();
    assert!(host.sink_mut().write(&wire));

    let echoed = source.drain_bytes();
    let results = host.receive(&echoed);
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(DeviceError::UnknownMessageType(PUSH_CLOCK_CONFIG))
    ));

    // The same bytes under the data tag are a (short layout) clock snapshot.
    let as_data = build_command(CLOCK_CONFIG, &payload).unwrap();
    let results = host.receive(&as_data);
    assert!(matches!(
        results[0],
        Ok(Message::ClockConfig(ClockConfig { source: None, .. }))
    ));
}

#[test]
fn register_snapshot_scenario() {
    let (mut device_side, mut host_source) = loopback();
    let reply = build_command(ENCODER_CONFIG, &[0x80, 0x10, 0x8C, 0x21]).unwrap();
    assert!(device_side.write(&reply));

    let mut host = Device::new(loopback().0);
    let results = host.receive(&host_source.drain_bytes());
    let message = results.into_iter().next().unwrap().unwrap();
    assert_eq!(
        message,
        Message::EncoderConfig(EncoderSnapshot {
            registers: BTreeMap::from([(0x80, 0x10), (0x8C, 0x21)])
        })
    );
}

#[test]
fn unknown_tag_scenario() {
    let mut host = Device::new(loopback().0);
    let results = host.receive(&build_command(0xFF, &[]).unwrap());
    assert!(matches!(
        results.as_slice(),
        [Err(DeviceError::UnknownMessageType(0xFF))]
    ));
}

#[test]
fn chunking_does_not_change_messages() {
    let timing = DisplayTiming {
        h_sync_width: 1,
        h_back_porch: 46,
        active_width: 800,
        h_front_porch: 210,
        v_sync_height: 1,
        v_back_porch: 23,
        active_height: 480,
        v_front_porch: 22,
    }
    .to_config();
    let mut wire = build_command(TIMING_CONFIG, &timing.to_payload()).unwrap().to_vec();
    wire.extend_from_slice(&build_command(ENCODER_CONFIG, &[0x00, 0x12]).unwrap());

    let collect = |chunk: usize| {
        let mut host = Device::new(loopback().0);
        wire.chunks(chunk)
            .flat_map(|piece| host.receive(piece))
            .map(|result| result.unwrap())
            .collect::<Vec<Message>>()
    };

    let whole = collect(wire.len());
    assert_eq!(whole.len(), 2);
    assert_eq!(whole[0], Message::TimingConfig(timing));
    assert_eq!(collect(1), whole);
    assert_eq!(collect(7), whole);
    assert_eq!(collect(FRAME_SIZE), whole);
}

#[test]
fn sent_commands_reach_the_wire_in_order() {
    let (sink, source) = loopback();
    let mut host = Device::new(sink);

    let mut commands = vec![
        Command::GetTimingConfig,
        Command::PushClockConfig(ClockSettings {
            pll_sai_n: 192,
            pll_sai_r: 5,
            pll_sai_div_r: 1,
        }),
    ];
    commands.extend(Command::encoder_writes((0u8..40).map(|a| (a, 0))));
    host.send_all(&commands).unwrap();
    assert_eq!(host.stats().commands_sent, 4);

    let mut reader = FrameReader::new(source);
    for command in &commands {
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame, command.to_frame());
    }
}

#[test]
fn subscribers_and_register_map_follow_device_reports() {
    let (mut device_side, mut host_source) = loopback();
    let mut map = RegisterMap::adv7393().unwrap();
    let changed = Arc::new(Mutex::new(Vec::new()));

    let mut host = Device::new(loopback().0);
    let seen = Arc::clone(&changed);
    host.subscribe(move |message, _| {
        if let Message::EncoderConfig(snapshot) = message {
            seen.lock().unwrap().push(snapshot.clone());
        }
    });

    let report = build_command(ENCODER_CONFIG, &[0x00, 0x13, 0x80, 0x10]).unwrap();
    assert!(device_side.write(&report));
    while let Some(chunk) = host_source.next_chunk().unwrap() {
        let errors = host.on_chunk(&chunk.bytes, SystemTime::now());
        assert!(errors.is_empty());
    }

    let snapshots = changed.lock().unwrap();
    assert_eq!(snapshots.len(), 1);
    let diff = snapshots[0].apply_to(&mut map).unwrap();
    assert_eq!(diff.into_iter().collect::<Vec<_>>(), vec![0x00]);
    assert_eq!(map.dirty_registers(), vec![0x00]);
}
