//! Receives every trap from the assembly trampolines and routes it to an
//! exception handler or an IRQ handler.
//!
//! The dispatcher itself is stateless: the only state machine here is the
//! processor's own interrupt-disable flag, set by the trampoline's entry
//! sequence and cleared by `iret`.

use crate::config::IRQ_BASE_VECTOR;
use crate::interrupts::sink::{KeyboardSink, TimerSink};
use crate::machine::PortIo;

const MASTER_COMMAND_PORT: u16 = 0x20;
const SLAVE_COMMAND_PORT: u16 = 0xA0;
const KEYBOARD_DATA_PORT: u16 = 0x60;
const END_OF_INTERRUPT: u8 = 0x20;

/// Saved processor state at the moment a trap entered, laid out bit-exact
/// to what the assembly trampoline pushes.
///
/// Exists only on the stack for the duration of the handler call; nothing
/// in this core retains a `TrapFrame` past its handler invocation.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TrapFrame {
    pub gs: u32,
    pub fs: u32,
    pub es: u32,
    pub ds: u32,

    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    pub esp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,

    pub int_no: u32,
    pub err_code: u32,

    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    pub useresp: u32,
    pub ss: u32,
}

/// Human-readable descriptions for vectors 0-31.
/// Intel SDM Vol. 3A, the table every x86 bring-up kernel reproduces.
const EXCEPTION_DESCRIPTIONS: [&str; 32] = [
    "Division By Zero",
    "Debug",
    "Non-maskable Interrupt",
    "Breakpoint",
    "Overflow",
    "Out of Bounds",
    "Invalid Opcode",
    "No Coprocessor",
    "Double Fault",
    "Coprocessor Segment Overrun",
    "Invalid TSS",
    "Segment Not Present",
    "Stack-Segment Fault",
    "General Protection Fault",
    "Page Fault",
    "Reserved (15)",
    "x87 FPU Floating-Point Error",
    "Alignment Check Exception",
    "Machine Check Exception",
    "SIMD Floating-Point Exception",
    "Reserved (20)",
    "Reserved (21)",
    "Reserved (22)",
    "Reserved (23)",
    "Reserved (24)",
    "Reserved (25)",
    "Reserved (26)",
    "Reserved (27)",
    "Reserved (28)",
    "Reserved (29)",
    "Reserved (30)",
    "Reserved (31)",
];

const PAGE_FAULT_VECTOR: u32 = 14;

/// Exception entry point (vectors 0-31). Called from the trampolines with a
/// pointer to the saved register frame.
///
/// Current bring-up policy is unconditional panic — no exception is
/// handled. This function never returns.
pub fn handle_exception(frame: &TrapFrame) -> ! {
    let description = EXCEPTION_DESCRIPTIONS
        .get(frame.int_no as usize)
        .copied()
        .unwrap_or("Unknown Interrupt");

    log::error!(
        "exception {} [{}] err_code={}",
        frame.int_no,
        description,
        frame.err_code
    );

    if frame.int_no == PAGE_FAULT_VECTOR {
        let cr2 = unsafe { crate::machine::read_cr2() };
        log::error!("page fault at cr2={:#010x}", cr2);
    }

    panic!("unhandled interrupt");
}

/// IRQ entry point (vectors 32-47). Called from the trampolines with a
/// pointer to the saved register frame.
///
/// EOI is sent last, after dispatch, so the trampoline's `iret` completes
/// before the controller can deliver the next edge of the same line.
pub fn handle_irq(
    frame: &TrapFrame,
    io: &mut impl PortIo,
    timer: &mut impl TimerSink,
    keyboard: &mut impl KeyboardSink,
) {
    let irq_no = frame.int_no - IRQ_BASE_VECTOR as u32;

    if irq_no >= 8 {
        unsafe {
            io.outb(SLAVE_COMMAND_PORT, END_OF_INTERRUPT);
        }
    }

    match irq_no {
        0 => timer.on_tick(frame),
        1 => {
            let scancode = unsafe { io.inb(KEYBOARD_DATA_PORT) };
            keyboard.send_scancode(scancode);
        }
        other => log::warn!("unknown IRQ {}", other),
    }

    unsafe {
        io.outb(MASTER_COMMAND_PORT, END_OF_INTERRUPT);
    }
}
