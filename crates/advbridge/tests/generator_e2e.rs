//! End-to-end exercise of the generator deployment: batch queues plus model
//! state forwarding.

use advbridge::{Bridge, BridgeConfig, BridgeError, Profile};

const GENERATOR_STUB: &str = r#"
import collections

device = None
attack_blob = None
model_blob = None
model_state = None

_queue = collections.deque()

def set_device(name):
    global device
    device = name

def update_attack(encoded_data):
    global attack_blob
    attack_blob = bytes(encoded_data)

def update_model(encoded_data):
    global model_blob
    model_blob = bytes(encoded_data)

def push_batch(encoded_data):
    _queue.append(bytes(encoded_data))

def pop_batch():
    return _queue.popleft()

def push_model_state(encoded_data):
    global model_state
    model_state = bytes(encoded_data)
"#;

#[test]
fn generator_bridge_end_to_end() {
    advbridge::init_tracing();

    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("generator_stub.py"), GENERATOR_STUB).expect("write stub");

    let config =
        BridgeConfig::new("generator_stub", Profile::Generator).with_search_path(dir.path());
    let bridge = Bridge::initialize(config).expect("bridge init");

    bridge.set_device("cuda:0").expect("set_device");
    bridge.update_attack(b"linf-pgd").expect("update_attack");
    bridge.update_model(b"weights v1").expect("update_model");

    // Empty queue is a distinct condition, not a zero-length buffer.
    assert!(matches!(bridge.pop_batch(), Err(BridgeError::EmptyQueue)));

    // Exactly one push, exactly one pop: byte-identical round trip.
    let batch: Vec<u8> = (0..4096).map(|i| (i % 251) as u8).collect();
    bridge.push_batch(&batch).expect("push_batch");
    let popped = bridge.pop_batch().expect("pop_batch");
    assert_eq!(&*popped, &batch[..]);
    assert!(matches!(bridge.pop_batch(), Err(BridgeError::EmptyQueue)));

    // The queue is FIFO across calls from one thread.
    bridge.push_batch(b"first").expect("push first");
    bridge.push_batch(b"second").expect("push second");
    assert_eq!(&*bridge.pop_batch().expect("pop first"), b"first");
    assert_eq!(&*bridge.pop_batch().expect("pop second"), b"second");

    bridge.push_model_state(b"state_dict v2").expect("push_model_state");

    // Perturber/dataloader entry points are not part of this profile.
    assert!(matches!(
        bridge.perturb(b"batch"),
        Err(BridgeError::Unbound { operation }) if operation == "perturb"
    ));
    assert!(matches!(
        bridge.get_num_batches(),
        Err(BridgeError::Unbound { .. })
    ));

    // The popped buffer is independent of interpreter storage: still intact
    // once teardown has begun.
    bridge.push_batch(&batch).expect("push before finalize");
    let kept = bridge.pop_batch().expect("pop before finalize");
    bridge.finalize().expect("finalize");
    assert_eq!(&*kept, &batch[..]);

    let again =
        BridgeConfig::new("generator_stub", Profile::Generator).with_search_path(dir.path());
    assert!(matches!(
        Bridge::initialize(again),
        Err(BridgeError::Lifecycle { .. })
    ));
}
