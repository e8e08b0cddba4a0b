//! Bus Tests
//!
//! The master side of the bus against a simulated servo and a scripted peer.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bioloid::control_table::offset;
use bioloid::device::{Device, SimulatedServo};
use bioloid::port::{ChannelPort, Port};
use bioloid::protocol::{write_packet, ErrorCode, Id, Packet, ParseState, MAX_PARAMS};
use bioloid::storage::MemoryStorage;
use bioloid::{BioloidError, Bus};

type ServoDevice = Device<SimulatedServo, MemoryStorage, ChannelPort>;

const GOAL_POSITION: u8 = 0x1E;

/// Run a servo with `id` on its own thread until the bus is dropped
fn spawn_servo(id: u8) -> (Bus<ChannelPort>, JoinHandle<ServoDevice>) {
    let (device_port, master) = ChannelPort::pair();

    let mut table = SimulatedServo::new().into_table(MemoryStorage::new(), device_port);
    table.reset_to_initial_values();
    table.set_u8(offset::ID, id);
    table.set_u8(offset::RDT, 0);
    let mut device = Device::new(table);

    let handle = thread::spawn(move || loop {
        match device.step() {
            Ok(_) => {}
            Err(e) if e.is_disconnect() => return device,
            Err(e) => panic!("device failed: {}", e),
        }
    });

    (Bus::new(master, Duration::from_millis(500)), handle)
}

/// Queue a status frame on the peer end
fn queue_status(peer: &mut ChannelPort, id: Id, code: ErrorCode, data: &[u8]) {
    let mut storage = [0u8; MAX_PARAMS];
    let mut packet = Packet::new(&mut storage);
    packet.set_id(id);
    packet.set_error_code(code);
    packet.set_params(data);
    packet.update_checksum();
    write_packet(peer, &packet).unwrap();
}

// =============================================================================
// Against a Simulated Servo
// =============================================================================

#[test]
fn test_ping() {
    let (mut bus, handle) = spawn_servo(1);
    bus.ping(Id(1)).unwrap();
    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_ping_missing_device_times_out() {
    let (mut bus, handle) = spawn_servo(1);
    bus.set_timeout(Duration::from_millis(20));
    assert!(matches!(bus.ping(Id(2)), Err(BioloidError::Timeout)));
    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_read_fields() {
    let (mut bus, handle) = spawn_servo(1);

    assert_eq!(bus.read_u16(Id(1), offset::MODEL).unwrap(), SimulatedServo::MODEL);
    assert_eq!(
        bus.read_u8(Id(1), offset::VERSION).unwrap(),
        SimulatedServo::FIRMWARE_VERSION
    );

    let mut data = [0u8; 3];
    bus.read(Id(1), offset::ID, &mut data).unwrap();
    assert_eq!(data, [1, 1, 0]);

    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_write_then_read_back() {
    let (mut bus, handle) = spawn_servo(1);

    bus.write(Id(1), GOAL_POSITION, &[0x00, 0x02]).unwrap();
    assert_eq!(bus.read_u16(Id(1), GOAL_POSITION).unwrap(), 0x0200);

    bus.write(Id(1), offset::LED, &[1]).unwrap();
    drop(bus);
    let device = handle.join().unwrap();
    assert!(device.table().hooks().led_on());
}

#[test]
fn test_write_out_of_range_reports_device_error() {
    let (mut bus, handle) = spawn_servo(1);

    match bus.write(Id(1), 49, &[1, 2]) {
        Err(BioloidError::Device { id, code }) => {
            assert_eq!(id, Id(1));
            assert_eq!(code, ErrorCode::RANGE);
        }
        other => panic!("expected a range error, got {:?}", other),
    }

    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_reg_write_and_action() {
    let (mut bus, handle) = spawn_servo(1);

    bus.reg_write(Id(1), GOAL_POSITION, &[0x34, 0x01]).unwrap();
    assert_eq!(bus.read_u16(Id(1), GOAL_POSITION).unwrap(), 0);
    bus.action(Id(1)).unwrap();
    assert_eq!(bus.read_u16(Id(1), GOAL_POSITION).unwrap(), 0x0134);

    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_reset_moves_device_to_default_id() {
    let (mut bus, handle) = spawn_servo(4);

    bus.reset(Id(4)).unwrap();
    bus.ping(Id::DEFAULT).unwrap();

    drop(bus);
    let device = handle.join().unwrap();
    assert_eq!(device.id(), Id::DEFAULT);
}

#[test]
fn test_broadcast_does_not_wait() {
    let (mut bus, handle) = spawn_servo(1);

    bus.write(Id::BROADCAST, offset::ID, &[7]).unwrap();
    bus.ping(Id(7)).unwrap();

    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_sync_write() {
    let (mut bus, handle) = spawn_servo(2);

    let entries: [(Id, &[u8]); 2] = [(Id(1), &[0x10, 0x00]), (Id(2), &[0x20, 0x01])];
    bus.sync_write(GOAL_POSITION, 2, &entries).unwrap();
    assert_eq!(bus.read_u16(Id(2), GOAL_POSITION).unwrap(), 0x0120);

    drop(bus);
    handle.join().unwrap();
}

#[test]
fn test_scan_finds_device() {
    let (mut bus, handle) = spawn_servo(2);
    bus.set_timeout(Duration::from_millis(20));

    assert_eq!(bus.scan(0..=3).unwrap(), vec![Id(2)]);

    drop(bus);
    handle.join().unwrap();
}

// =============================================================================
// Against a Scripted Peer
// =============================================================================

#[test]
fn test_recv_status_timeout_abandons_partial_frame() {
    let (master, mut peer) = ChannelPort::pair();
    let mut bus = Bus::new(master, Duration::from_millis(20));

    peer.write_raw(&[0xff, 0xff, 0x01]).unwrap();
    let mut storage = [0u8; 4];
    let mut packet = Packet::new(&mut storage);
    assert!(matches!(
        bus.recv_status(&mut packet),
        Err(BioloidError::Timeout)
    ));
    assert_eq!(packet.state(), ParseState::Idle);

    queue_status(&mut peer, Id(1), ErrorCode::NONE, &[9]);
    bus.recv_status(&mut packet).unwrap();
    assert_eq!(packet.id(), Id(1));
    assert_eq!(packet.params(), &[9]);
}

#[test]
fn test_recv_status_times_out_on_noisy_line() {
    let (master, mut peer) = ChannelPort::pair();
    let mut bus = Bus::new(master, Duration::from_millis(10));

    // Far more line noise than can be drained before the deadline
    peer.write_raw(&vec![0x00; 2_000_000]).unwrap();

    let mut storage = [0u8; 4];
    let mut packet = Packet::new(&mut storage);
    let started = Instant::now();
    assert!(matches!(
        bus.recv_status(&mut packet),
        Err(BioloidError::Timeout)
    ));
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(packet.state(), ParseState::Idle);
    assert!(bus.port_mut().available().unwrap() > 0);
}

#[test]
fn test_reply_from_wrong_id() {
    let (master, mut peer) = ChannelPort::pair();
    let mut bus = Bus::new(master, Duration::from_millis(50));

    queue_status(&mut peer, Id(3), ErrorCode::NONE, &[]);
    assert!(matches!(bus.ping(Id(1)), Err(BioloidError::Protocol(_))));
}

#[test]
fn test_error_flags_become_device_error() {
    let (master, mut peer) = ChannelPort::pair();
    let mut bus = Bus::new(master, Duration::from_millis(50));

    queue_status(&mut peer, Id(1), ErrorCode::OVERHEATING, &[]);
    match bus.ping(Id(1)) {
        Err(BioloidError::Device { code, .. }) => assert!(code.contains(ErrorCode::OVERHEATING)),
        other => panic!("expected a device error, got {:?}", other),
    }
}

#[test]
fn test_short_read_reply() {
    let (master, mut peer) = ChannelPort::pair();
    let mut bus = Bus::new(master, Duration::from_millis(50));

    queue_status(&mut peer, Id(1), ErrorCode::NONE, &[0x0c]);
    let mut data = [0u8; 2];
    assert!(matches!(
        bus.read(Id(1), 0, &mut data),
        Err(BioloidError::Protocol(_))
    ));
}

#[test]
fn test_invalid_requests() {
    let (master, _peer) = ChannelPort::pair();
    let mut bus = Bus::new(master, Duration::from_millis(50));

    let mut data = [0u8; 1];
    assert!(matches!(
        bus.read(Id::BROADCAST, 0, &mut data),
        Err(BioloidError::Protocol(_))
    ));

    let mut too_big = vec![0u8; MAX_PARAMS + 1];
    assert!(matches!(
        bus.read(Id(1), 0, &mut too_big),
        Err(BioloidError::Protocol(_))
    ));
    assert!(matches!(
        bus.write(Id(1), 0, &too_big[..MAX_PARAMS]),
        Err(BioloidError::Protocol(_))
    ));

    let entries: [(Id, &[u8]); 1] = [(Id(1), &[1, 2, 3])];
    assert!(matches!(
        bus.sync_write(GOAL_POSITION, 2, &entries),
        Err(BioloidError::Protocol(_))
    ));
}
