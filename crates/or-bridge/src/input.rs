//! Input polling bridge
//!
//! The core drives input with two callbacks: `input_poll` asks the frontend
//! to latch device state, and `input_state` queries one control at a time.
//! Everything between a poll and the next is answered from a single
//! snapshot, so a frame sees a consistent view of the controls.

use std::os::raw::c_uint;

use bitflags::bitflags;
use or_abi as abi;

use crate::context;

/// Joypad ports the frontend answers for. Queries beyond this return 0.
pub const MAX_PORTS: usize = 4;

bitflags! {
    /// Digital joypad buttons, one bit per RETRO_DEVICE_ID_JOYPAD id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct JoypadButtons: u16 {
        const B      = 1 << abi::DEVICE_ID_JOYPAD_B;
        const Y      = 1 << abi::DEVICE_ID_JOYPAD_Y;
        const SELECT = 1 << abi::DEVICE_ID_JOYPAD_SELECT;
        const START  = 1 << abi::DEVICE_ID_JOYPAD_START;
        const UP     = 1 << abi::DEVICE_ID_JOYPAD_UP;
        const DOWN   = 1 << abi::DEVICE_ID_JOYPAD_DOWN;
        const LEFT   = 1 << abi::DEVICE_ID_JOYPAD_LEFT;
        const RIGHT  = 1 << abi::DEVICE_ID_JOYPAD_RIGHT;
        const A      = 1 << abi::DEVICE_ID_JOYPAD_A;
        const X      = 1 << abi::DEVICE_ID_JOYPAD_X;
        const L      = 1 << abi::DEVICE_ID_JOYPAD_L;
        const R      = 1 << abi::DEVICE_ID_JOYPAD_R;
        const L2     = 1 << abi::DEVICE_ID_JOYPAD_L2;
        const R2     = 1 << abi::DEVICE_ID_JOYPAD_R2;
        const L3     = 1 << abi::DEVICE_ID_JOYPAD_L3;
        const R3     = 1 << abi::DEVICE_ID_JOYPAD_R3;
    }
}

/// All input for one joypad port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortInput {
    pub buttons: JoypadButtons,
    /// `[stick][axis]` with stick 0 = left, 1 = right and axis 0 = X,
    /// 1 = Y. Full signed range, negative is left/up.
    pub analog: [[i16; 2]; 2],
}

/// State of every port, latched at `input_poll` time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub ports: [PortInput; MAX_PORTS],
}

impl InputSnapshot {
    /// Answer one `input_state` query. Unknown devices, out-of-range ports
    /// and unmapped ids all read as 0 rather than failing.
    pub fn state(&self, port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
        let Some(port_input) = self.ports.get(port as usize) else {
            return 0;
        };
        match device {
            abi::DEVICE_JOYPAD => {
                if id > abi::DEVICE_ID_JOYPAD_R3 {
                    return 0;
                }
                let mask = JoypadButtons::from_bits_truncate(1u16 << id);
                i16::from(port_input.buttons.contains(mask))
            }
            abi::DEVICE_ANALOG => {
                let stick = match index {
                    abi::DEVICE_INDEX_ANALOG_LEFT => 0,
                    abi::DEVICE_INDEX_ANALOG_RIGHT => 1,
                    _ => return 0,
                };
                let axis = match id {
                    abi::DEVICE_ID_ANALOG_X => 0,
                    abi::DEVICE_ID_ANALOG_Y => 1,
                    _ => return 0,
                };
                port_input.analog[stick][axis]
            }
            _ => 0,
        }
    }
}

/// Trampoline registered through `retro_set_input_poll`. Latches a fresh
/// snapshot from the session's input source.
///
/// # Safety
///
/// Only meant to be invoked by the core; takes no pointers.
pub unsafe extern "C" fn input_poll_callback() {
    let _ = context::with_session(|ctx| {
        ctx.input_snapshot = ctx.input_source.poll();
    });
}

/// Trampoline registered through `retro_set_input_state`. Answers from the
/// last latched snapshot; without a session everything reads released.
///
/// # Safety
///
/// Only meant to be invoked by the core; takes no pointers.
pub unsafe extern "C" fn input_state_callback(
    port: c_uint,
    device: c_uint,
    index: c_uint,
    id: c_uint,
) -> i16 {
    context::with_session(|ctx| ctx.input_snapshot.state(port, device, index, id)).unwrap_or(0)
}
