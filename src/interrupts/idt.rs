//! The interrupt descriptor table: 256 gates mapping vector numbers to the
//! assembly trampolines that enter [`super::trap`].

use spin::Mutex;

use crate::config::{IDT_ENTRY_COUNT, INTERRUPT_GATE_TYPE_ATTR, KERNEL_CODE_SELECTOR};

/// A single 64-bit IDT gate, bit-exact: offset low 16, selector 16,
/// zero 8, type-attributes 8, offset high 16.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
struct Gate {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

impl Gate {
    const fn absent() -> Self {
        Gate {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_attr: 0,
            offset_high: 0,
        }
    }

    fn present(handler: u32, selector: u16, type_attr: u8) -> Self {
        Gate {
            offset_low: (handler & 0xFFFF) as u16,
            selector,
            zero: 0,
            type_attr,
            offset_high: ((handler >> 16) & 0xFFFF) as u16,
        }
    }
}

/// The 256-entry interrupt descriptor table. All unused vectors remain
/// zero (not present), so a spurious delivery produces a double fault
/// rather than dispatching through a stale handler.
pub struct InterruptDescriptorTable {
    gates: [Gate; IDT_ENTRY_COUNT],
}

impl InterruptDescriptorTable {
    pub const fn new() -> Self {
        InterruptDescriptorTable {
            gates: [Gate::absent(); IDT_ENTRY_COUNT],
        }
    }

    /// Write gate `vector` bit-exactly. `handler_entry_point` is the
    /// trampoline's address.
    pub fn set_gate(&mut self, vector: u8, handler_entry_point: u32) {
        self.gates[vector as usize] =
            Gate::present(handler_entry_point, KERNEL_CODE_SELECTOR, INTERRUPT_GATE_TYPE_ATTR);
    }

    fn base(&self) -> u32 {
        self.gates.as_ptr() as u32
    }

    fn limit(&self) -> u16 {
        (core::mem::size_of::<[Gate; IDT_ENTRY_COUNT]>() - 1) as u16
    }
}

pub static IDT: Mutex<InterruptDescriptorTable> = Mutex::new(InterruptDescriptorTable::new());

/// Load the IDT pointer register. Must run after every gate this core cares
/// about has been installed.
///
/// # Safety
/// Must only be called once all referenced handler entry points are valid
/// and the processor is ready to take interrupts.
pub unsafe fn load() {
    let idt = IDT.lock();
    let base = idt.base();
    let limit = idt.limit();
    unsafe {
        crate::machine::load_idt(base, limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_gate_encodes_offset_and_type_attr_bit_exact() {
        let mut idt = InterruptDescriptorTable::new();
        idt.set_gate(14, 0xC010_1234);

        let gate = idt.gates[14];
        assert_eq!({ gate.offset_low }, 0x1234);
        assert_eq!({ gate.offset_high }, 0xC010);
        assert_eq!({ gate.selector }, KERNEL_CODE_SELECTOR);
        assert_eq!(gate.zero, 0);
        assert_eq!(gate.type_attr, INTERRUPT_GATE_TYPE_ATTR);
    }

    #[test]
    fn unset_vectors_remain_absent() {
        let idt = InterruptDescriptorTable::new();
        assert_eq!(idt.gates[7].type_attr, 0);
    }

    #[test]
    fn limit_matches_256_gates() {
        let idt = InterruptDescriptorTable::new();
        assert_eq!(idt.limit() as usize, IDT_ENTRY_COUNT * 8 - 1);
    }
}
