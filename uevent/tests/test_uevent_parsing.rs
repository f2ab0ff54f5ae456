use std::ffi::OsString;

use uevent::modprobe::{ModprobeBatch, ModuleLoadBatcher, ModuleLoader};
use uevent::parser::{parse, parse_with};

const RESERVED: [&str; 4] = ["action", "devpath", "seqnum", "synth_uuid"];

#[derive(Default)]
struct Calls(Vec<Vec<OsString>>);

impl ModuleLoader for Calls {
    fn load(&mut self, aliases: &[OsString]) {
        self.0.push(aliases.to_vec());
    }
}

#[test]
fn test_reserved_keys_never_emitted() {
    let samples: [&[u8]; 4] = [
        b"add@/devices/a\0ACTION=add\0DEVPATH=/devices/a\0SEQNUM=1\0SYNTH_UUID=0\0KEEP=1\0",
        b"add@/devices/a\0action=add\0devpath=/devices/a\0seqnum=1\0synth_uuid=0\0KEEP=1\0",
        b"add@/devices/a\0Action=add\0DevPath=/x\0SeqNum=1\0Synth_UUID=x\0KEEP=1\0",
        b"add@/devices/a\0KEEP=1\0SEQNUM=\0DEVPATH=\0",
    ];
    for raw in samples {
        let record = parse(raw).unwrap();
        for (key, _) in record.attributes.iter() {
            let key = String::from_utf8_lossy(key).to_lowercase();
            assert!(!RESERVED.contains(&key.as_str()), "{key} leaked");
        }
        assert_eq!(record.attributes.get("keep"), Some(&b"1"[..]));
    }
}

#[test]
fn test_keys_lowercase_values_verbatim() {
    let raw = b"change@/devices/virtual/block/loop0\0DISK_MEDIA_CHANGE=1\0Dev_Name=Loop0\0ID_FS_LABEL=My Disk\0";
    let record = parse(raw).unwrap();
    for (key, _) in record.attributes.iter() {
        assert!(!key.iter().any(u8::is_ascii_uppercase));
    }
    assert_eq!(record.attributes.get("dev_name"), Some(&b"Loop0"[..]));
    assert_eq!(record.attributes.get("id_fs_label"), Some(&b"My Disk"[..]));
}

#[test]
fn test_rejected_events_produce_nothing() {
    assert!(parse(b"add\0SUBSYSTEM=x\0").is_none());
    assert!(parse(b"add@/bus/usb\0").is_none());
    assert!(parse(b"online@devices/cpu0\0").is_none());
}

#[test]
fn test_device_prefix_is_a_plain_prefix() {
    let record = parse(b"add@/devices\0").unwrap();
    assert_eq!(record.devpath_lossy(), vec!["devices"]);
}

#[test]
fn test_repeated_slashes_do_not_make_empty_segments() {
    let record = parse(b"move@/devices//virtual/net/eth0/\0").unwrap();
    assert_eq!(record.devpath_lossy(), vec!["devices", "virtual", "net", "eth0"]);
}

#[test]
fn test_modalias_stream_flushes_before_overflow() {
    // 10 aliases of 99 chars each cost 100 bytes apiece against a 1024 byte budget,
    // so the 11th would overflow and must trigger exactly one flush first
    let aliases: Vec<String> = (0..11).map(|i| format!("usb:v{i:094}")).collect();
    assert!(aliases.iter().all(|a| a.len() == 99));

    let mut batcher = ModuleLoadBatcher::with_batch(Calls::default(), ModprobeBatch::new());
    for (i, alias) in aliases.iter().enumerate() {
        let raw = format!("add@/devices/usb{i}\0MODALIAS={alias}\0");
        parse_with(raw.as_bytes(), |a| batcher.enqueue(a)).unwrap();
    }

    assert_eq!(batcher.loader().0.len(), 1);
    let expected: Vec<OsString> = aliases[..10].iter().map(OsString::from).collect();
    assert_eq!(batcher.loader().0[0], expected);
    assert_eq!(batcher.pending(), 1);
}
