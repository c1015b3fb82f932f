//! Interrupt delivery path: IDT population, PIC remap, PIT programming,
//! and the trap dispatcher that the 48 per-vector assembly trampolines
//! call into.
//!
//! The trampolines themselves — pushing `int_no` and a zero `err_code`
//! where the processor doesn't, saving/restoring the general registers,
//! `iret` — live outside this crate and are expected to be hand-written
//! assembly or generated by a macro, one per vector, each calling
//! [`dispatch_exception`] or [`dispatch_irq`] with a pointer to the frame
//! it built.

pub mod idt;
pub mod pic;
pub mod pit;
pub mod sink;
pub mod trap;

use crate::config::PIT_DEFAULT_HZ;
use crate::machine::{PortIo, Ports};
use sink::{KeyboardSink, TimerSink};
use trap::TrapFrame;

#[cfg(not(test))]
extern "C" {
    fn interrupt_handler_0();
    fn interrupt_handler_1();
    fn interrupt_handler_2();
    fn interrupt_handler_3();
    fn interrupt_handler_4();
    fn interrupt_handler_5();
    fn interrupt_handler_6();
    fn interrupt_handler_7();
    fn interrupt_handler_8();
    fn interrupt_handler_9();
    fn interrupt_handler_10();
    fn interrupt_handler_11();
    fn interrupt_handler_12();
    fn interrupt_handler_13();
    fn interrupt_handler_14();
    fn interrupt_handler_15();
    fn interrupt_handler_16();
    fn interrupt_handler_17();
    fn interrupt_handler_18();
    fn interrupt_handler_19();
    fn interrupt_handler_20();
    fn interrupt_handler_21();
    fn interrupt_handler_22();
    fn interrupt_handler_23();
    fn interrupt_handler_24();
    fn interrupt_handler_25();
    fn interrupt_handler_26();
    fn interrupt_handler_27();
    fn interrupt_handler_28();
    fn interrupt_handler_29();
    fn interrupt_handler_30();
    fn interrupt_handler_31();

    fn irq_handler_32();
    fn irq_handler_33();
    fn irq_handler_34();
    fn irq_handler_35();
    fn irq_handler_36();
    fn irq_handler_37();
    fn irq_handler_38();
    fn irq_handler_39();
    fn irq_handler_40();
    fn irq_handler_41();
    fn irq_handler_42();
    fn irq_handler_43();
    fn irq_handler_44();
    fn irq_handler_45();
    fn irq_handler_46();
    fn irq_handler_47();
}

/// Install every gate and bring the interrupt controller and timer up.
/// Leaves interrupts disabled; the caller enables them once the rest of
/// bring-up has finished.
///
/// # Safety
/// Must run after the trampolines above are linked in and before any code
/// depends on interrupts being deliverable.
#[cfg(not(test))]
pub unsafe fn init() {
    {
        let mut idt = idt::IDT.lock();

        idt.set_gate(0, interrupt_handler_0 as u32);
        idt.set_gate(1, interrupt_handler_1 as u32);
        idt.set_gate(2, interrupt_handler_2 as u32);
        idt.set_gate(3, interrupt_handler_3 as u32);
        idt.set_gate(4, interrupt_handler_4 as u32);
        idt.set_gate(5, interrupt_handler_5 as u32);
        idt.set_gate(6, interrupt_handler_6 as u32);
        idt.set_gate(7, interrupt_handler_7 as u32);
        idt.set_gate(8, interrupt_handler_8 as u32);
        idt.set_gate(9, interrupt_handler_9 as u32);
        idt.set_gate(10, interrupt_handler_10 as u32);
        idt.set_gate(11, interrupt_handler_11 as u32);
        idt.set_gate(12, interrupt_handler_12 as u32);
        idt.set_gate(13, interrupt_handler_13 as u32);
        idt.set_gate(14, interrupt_handler_14 as u32);
        idt.set_gate(15, interrupt_handler_15 as u32);
        idt.set_gate(16, interrupt_handler_16 as u32);
        idt.set_gate(17, interrupt_handler_17 as u32);
        idt.set_gate(18, interrupt_handler_18 as u32);
        idt.set_gate(19, interrupt_handler_19 as u32);
        idt.set_gate(20, interrupt_handler_20 as u32);
        idt.set_gate(21, interrupt_handler_21 as u32);
        idt.set_gate(22, interrupt_handler_22 as u32);
        idt.set_gate(23, interrupt_handler_23 as u32);
        idt.set_gate(24, interrupt_handler_24 as u32);
        idt.set_gate(25, interrupt_handler_25 as u32);
        idt.set_gate(26, interrupt_handler_26 as u32);
        idt.set_gate(27, interrupt_handler_27 as u32);
        idt.set_gate(28, interrupt_handler_28 as u32);
        idt.set_gate(29, interrupt_handler_29 as u32);
        idt.set_gate(30, interrupt_handler_30 as u32);
        idt.set_gate(31, interrupt_handler_31 as u32);

        idt.set_gate(32, irq_handler_32 as u32);
        idt.set_gate(33, irq_handler_33 as u32);
        idt.set_gate(34, irq_handler_34 as u32);
        idt.set_gate(35, irq_handler_35 as u32);
        idt.set_gate(36, irq_handler_36 as u32);
        idt.set_gate(37, irq_handler_37 as u32);
        idt.set_gate(38, irq_handler_38 as u32);
        idt.set_gate(39, irq_handler_39 as u32);
        // The source registers `irq_handler_40` at vector 30 instead of 40 —
        // almost certainly a typo, but it is the observable behavior being
        // carried forward, not corrected. This clobbers the vector-30
        // exception gate set above and leaves vector 40 permanently absent.
        idt.set_gate(30, irq_handler_40 as u32);
        idt.set_gate(41, irq_handler_41 as u32);
        idt.set_gate(42, irq_handler_42 as u32);
        idt.set_gate(43, irq_handler_43 as u32);
        idt.set_gate(44, irq_handler_44 as u32);
        idt.set_gate(45, irq_handler_45 as u32);
        idt.set_gate(46, irq_handler_46 as u32);
        idt.set_gate(47, irq_handler_47 as u32);
    }

    unsafe {
        idt::load();
    }

    let mut ports = Ports::new();
    pic::remap(&mut ports);
    pit::init(&mut ports, PIT_DEFAULT_HZ);
}

#[cfg(test)]
pub unsafe fn init() {
    unreachable!("interrupts::init links against trampolines not present under test")
}

/// Entry point for vectors 0-31, called by a trampoline with the frame it
/// built on the stack.
pub fn dispatch_exception(frame: &TrapFrame) -> ! {
    trap::handle_exception(frame)
}

/// Entry point for vectors 32-47, called by a trampoline with the frame it
/// built on the stack.
pub fn dispatch_irq(frame: &TrapFrame, timer: &mut impl TimerSink, keyboard: &mut impl KeyboardSink) {
    let mut ports = Ports::new();
    trap::handle_irq(frame, &mut ports, timer, keyboard)
}
