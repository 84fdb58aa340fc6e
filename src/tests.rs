//! Integration tests driving a device against a scripted modem on an
//! in-memory duplex stream.

use crate::device::sms::SmsFormat;
use crate::device::{AtError, Device, DeviceConfig, Urc, UrcHandler};
use crate::pdu::dcs::Dcs;
use crate::pdu::deliver::Deliver;
use crate::pdu::frame::PduFrame;
use crate::pdu::timestamp::Scts;
use crate::pdu::tpdu::Tpdu;
use crate::pdu::udh::UserDataHeader;
use crate::pdu::user_data::UserData;
use crate::pdu::Address;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// The modem side of the duplex link: reads host commands, writes scripted
/// responses.
struct Modem {
    stream: DuplexStream,
    buf: Vec<u8>,
}

impl Modem {
    fn new(stream: DuplexStream) -> Self {
        Modem {
            stream,
            buf: Vec::new(),
        }
    }

    /// Read one host command, terminated by LF or Ctrl-Z, without its
    /// terminator.
    async fn read_command(&mut self) -> String {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n' || b == 0x1A) {
                let raw: Vec<u8> = self.buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&raw);
                return text.trim_end_matches(['\r', '\n', '\u{1A}']).to_string();
            }
            let mut chunk = [0u8; 256];
            let n = self.stream.read(&mut chunk).await.expect("modem read");
            assert!(n > 0, "host closed the port mid-script");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    async fn reply(&mut self, response: &str) {
        self.stream
            .write_all(response.as_bytes())
            .await
            .expect("modem write");
    }
}

fn open_device(config: DeviceConfig, handler: Option<UrcHandler>) -> (Device, Modem) {
    let (host, modem) = tokio::io::duplex(4096);
    (Device::open(host, handler, config), Modem::new(modem))
}

fn capture_urcs() -> (UrcHandler, Arc<Mutex<Vec<Urc>>>) {
    let seen: Arc<Mutex<Vec<Urc>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: UrcHandler = Arc::new(move |urc| {
        sink.lock().unwrap().push(urc);
    });
    (handler, seen)
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within one second");
}

#[tokio::test]
async fn test_command_round_trip() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT");
        modem.reply("AT\r\nOK\r\n").await;
        modem
    });

    let lines = device.send("AT").await.unwrap();
    assert_eq!(lines, ["AT", "OK"]);
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn signal_query_parses_fields() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CSQ");
        modem.reply("AT+CSQ\r\n+CSQ: 15,0\r\nOK\r\n").await;
    });

    let quality = device.signal_quality().await.unwrap();
    assert_eq!((quality.rssi, quality.ber), (15, 0));
    assert_eq!(quality.dbm(), Some(-83));
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn urc_while_idle_reaches_handler_not_queue() {
    let (handler, seen) = capture_urcs();
    let (device, mut modem) = open_device(DeviceConfig::default(), Some(handler));

    modem.reply("+CMTI: \"SM\",3\r\n").await;
    wait_for(|| !seen.lock().unwrap().is_empty()).await;

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].label, "+CMTI");
        assert_eq!(seen[0].params, ["SM", "3"]);
    }

    // The response queue stayed empty: the next command sees only its own
    // lines.
    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT");
        modem.reply("OK\r\n").await;
    });
    let lines = device.send("AT").await.unwrap();
    assert_eq!(lines, ["OK"]);
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn echoed_response_with_urc_prefix_stays_in_response_set() {
    let (handler, seen) = capture_urcs();
    let (device, mut modem) = open_device(DeviceConfig::default(), Some(handler));

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CREG?");
        modem.reply("+CREG: 0,1\r\nOK\r\n").await;
        modem
    });

    let registration = device.network_registration().await.unwrap();
    assert_eq!(registration.notify_mode, 0);
    assert_eq!(registration.status, 1);
    assert!(registration.is_registered());
    let mut modem = script.await.unwrap();

    // The same line while no +CREG command is in flight is unsolicited.
    modem.reply("+CREG: 1\r\n").await;
    wait_for(|| !seen.lock().unwrap().is_empty()).await;
    assert_eq!(seen.lock().unwrap()[0].label, "+CREG");
    device.close().await;
}

#[tokio::test]
async fn timeout_returns_partial_lines() {
    let config = DeviceConfig {
        command_timeout: Duration::from_millis(100),
        ..DeviceConfig::default()
    };
    let (device, mut modem) = open_device(config, None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CSQ");
        modem.reply("+CSQ: 15,0\r\n").await;
        modem
    });

    match device.send("AT+CSQ").await {
        Err(AtError::Timeout { lines }) => assert_eq!(lines, ["+CSQ: 15,0"]),
        other => panic!("expected timeout, got {other:?}"),
    }
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn stale_lines_are_drained_before_the_next_command() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    // A line nobody asked for lands in the response queue.
    modem.reply("STALE\r\n").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT");
        modem.reply("OK\r\n").await;
    });
    let lines = device.send("AT").await.unwrap();
    assert_eq!(lines, ["OK"]);
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn concurrent_sends_do_not_interleave_on_the_wire() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);
    let device = Arc::new(device);

    let script = tokio::spawn(async move {
        let mut commands = Vec::new();
        for _ in 0..2 {
            let command = modem.read_command().await;
            commands.push(command);
            modem.reply("OK\r\n").await;
        }
        commands
    });

    let first = {
        let device = device.clone();
        tokio::spawn(async move { device.send("AT+CGMI").await })
    };
    let second = {
        let device = device.clone();
        tokio::spawn(async move { device.send("AT+CGMM").await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // Each command line arrived whole; only the order is unspecified.
    let mut commands = script.await.unwrap();
    commands.sort();
    assert_eq!(commands, ["AT+CGMI", "AT+CGMM"]);
    device.close().await;
}

#[tokio::test]
async fn close_is_idempotent_and_terminal() {
    let (device, _modem) = open_device(DeviceConfig::default(), None);

    assert!(device.is_open());
    device.close().await;
    device.close().await;
    assert!(!device.is_open());

    match device.send("AT").await {
        Err(AtError::Closed { .. }) => {}
        other => panic!("expected closed, got {other:?}"),
    }
}

#[tokio::test]
async fn close_cancels_a_pending_send() {
    let config = DeviceConfig {
        command_timeout: Duration::from_secs(30),
        ..DeviceConfig::default()
    };
    let (device, mut modem) = open_device(config, None);
    let device = Arc::new(device);

    let sender = {
        let device = device.clone();
        tokio::spawn(async move { device.send("AT").await })
    };
    // Let the send reach its wait before closing.
    assert_eq!(modem.read_command().await, "AT");
    device.close().await;

    match sender.await.unwrap() {
        Err(AtError::Closed { .. }) => {}
        other => panic!("expected closed, got {other:?}"),
    }
}

#[tokio::test]
async fn end_of_stream_closes_the_device() {
    let (device, modem) = open_device(DeviceConfig::default(), None);
    drop(modem);
    wait_for(|| !device.is_open()).await;

    match device.send("AT").await {
        Err(AtError::Closed { .. }) => {}
        other => panic!("expected closed, got {other:?}"),
    }
}

#[tokio::test]
async fn pdu_mode_send_waits_for_the_prompt() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CMGS=19");
        // The prompt is never newline-terminated.
        modem.reply("\r\n> ").await;
        assert_eq!(
            modem.read_command().await,
            "0001000D91683108108300F0000005E8329BFD06"
        );
        modem.reply("+CMGS: 1\r\nOK\r\n").await;
    });

    device.send_sms("+8613800138000", "hello").await.unwrap();
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn rejected_submission_is_an_error() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CMGS=19");
        modem.reply("\r\n> ").await;
        modem.read_command().await;
        modem.reply("+CMS ERROR: 304\r\n").await;
    });

    match device.send_sms("+8613800138000", "hello").await {
        Err(AtError::UnexpectedResponse { lines, .. }) => {
            assert_eq!(lines, ["+CMS ERROR: 304"]);
        }
        other => panic!("expected unexpected-response, got {other:?}"),
    }
    script.await.unwrap();
    device.close().await;
}

fn deliver_segment(reference: u8, total: u8, sequence: u8, text: &str) -> String {
    let dcs = Dcs::ucs2();
    let user_data = UserData::from_text(text, &dcs).unwrap();
    let mut deliver = Deliver::new(
        Address::new("+8613800138000"),
        dcs,
        Scts {
            year: 24,
            month: 5,
            day: 17,
            hour: 10,
            minute: 30,
            second: 5,
            tz_quarters: 32,
        },
        user_data,
    );
    deliver.udh = Some(UserDataHeader::concat8(reference, total, sequence));
    PduFrame::new(&Tpdu::Deliver(deliver))
        .unwrap()
        .to_hex()
        .unwrap()
}

#[tokio::test]
async fn listing_reassembles_concatenated_messages() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let first = deliver_segment(0x42, 2, 1, "你");
    let second = deliver_segment(0x42, 2, 2, "好");
    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CMGL=4");
        let response = format!(
            "+CMGL: 1,1,,26\r\n{first}\r\n+CMGL: 2,1,,26\r\n{second}\r\nOK\r\n"
        );
        modem.reply(&response).await;
    });

    let messages = device.list_sms(4).await.unwrap();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.number, "+8613800138000");
    assert_eq!(message.text, "你好");
    assert_eq!(message.index, 1);
    assert_eq!(message.indices, [1, 2]);
    assert_eq!(message.status, "1");
    assert_eq!(message.time, "2024/05/17 10:30:05");
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn listing_keeps_singles_and_skips_partials() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let dcs = Dcs::gsm7();
    let single = Deliver::new(
        Address::new("+31641600986"),
        dcs,
        Scts::default(),
        UserData::from_text("ping", &dcs).unwrap(),
    );
    let single = PduFrame::new(&Tpdu::Deliver(single)).unwrap().to_hex().unwrap();
    let orphan = deliver_segment(0x07, 3, 1, "一");

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CMGL=4");
        let response = format!(
            "+CMGL: 5,1,,20\r\n{single}\r\n+CMGL: 6,1,,26\r\n{orphan}\r\nOK\r\n"
        );
        modem.reply(&response).await;
    });

    let messages = device.list_sms(4).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "ping");
    assert_eq!(messages[0].number, "+31641600986");
    assert_eq!(messages[0].indices, [5]);
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn simple_query_skips_the_echo() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CGSN");
        modem.reply("AT+CGSN\r\n868154061234567\r\nOK\r\n").await;
    });

    assert_eq!(device.imei().await.unwrap(), "868154061234567");
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn sms_format_selection() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CMGF=0");
        modem.reply("OK\r\n").await;
        assert_eq!(modem.read_command().await, "AT+CMGF?");
        modem.reply("+CMGF: 0\r\nOK\r\n").await;
    });

    device.set_sms_format(SmsFormat::Pdu).await.unwrap();
    assert_eq!(device.sms_format().await.unwrap(), 0);
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn cme_error_terminates_the_command() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        assert_eq!(modem.read_command().await, "AT+CPIN?");
        modem.reply("+CME ERROR: 10\r\n").await;
    });

    let lines = device.send("AT+CPIN?").await.unwrap();
    assert_eq!(lines, ["+CME ERROR: 10"]);
    script.await.unwrap();
    device.close().await;
}

#[tokio::test]
async fn send_expect_reports_missing_substring() {
    let (device, mut modem) = open_device(DeviceConfig::default(), None);

    let script = tokio::spawn(async move {
        modem.read_command().await;
        modem.reply("ERROR\r\n").await;
    });

    match device.send_expect("ATE0", "OK").await {
        Err(AtError::UnexpectedResponse { expected, lines }) => {
            assert_eq!(expected, "OK");
            assert_eq!(lines, ["ERROR"]);
        }
        other => panic!("expected unexpected-response, got {other:?}"),
    }
    script.await.unwrap();
    device.close().await;
}
