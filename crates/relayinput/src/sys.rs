//! The real uinput-backed event sink.

use evdev::{
    AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    uinput::{VirtualDevice, VirtualDeviceBuilder},
};

use crate::{Error, EventSink, Result};

/// Lowest keycode registered on the virtual device (KEY_ESC).
const FIRST_KEYCODE: u16 = 1;
/// Highest keycode registered on the virtual device (KEY_MICMUTE). Covers
/// every catalog key plus the media transport keys.
const LAST_KEYCODE: u16 = 248;

/// Sink that writes key events to a uinput virtual keyboard.
pub struct UinputSink {
    /// The kernel-side virtual device.
    device: VirtualDevice,
}

impl UinputSink {
    /// Create the virtual keyboard. Fails when `/dev/uinput` is missing or
    /// not writable by this process.
    pub fn open() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in FIRST_KEYCODE..=LAST_KEYCODE {
            keys.insert(Key::new(code));
        }
        let device = VirtualDeviceBuilder::new()
            .map_err(Error::DeviceCreate)?
            .name("oscbridge-virtual-keyboard")
            .input_id(InputId::new(BusType::BUS_USB, 0x1234, 0x5679, 0x1))
            .with_keys(&keys)
            .map_err(Error::DeviceCreate)?
            .build()
            .map_err(Error::DeviceCreate)?;
        Ok(Self { device })
    }
}

impl EventSink for UinputSink {
    fn key_event(&mut self, code: u16, pressed: bool) -> Result<()> {
        let value = i32::from(pressed);
        // emit() appends the SYN_REPORT, so the receiver sees each state
        // change as a complete transition.
        self.device
            .emit(&[InputEvent::new(EventType::KEY, code, value)])
            .map_err(Error::EventWrite)
    }
}
