//! Rust half of a 32-bit x86 kernel's bring-up path: paging, the physical
//! frame allocator, and interrupt delivery. Assembly entry trampolines,
//! the linker script, and the multiboot-compliant loader stub live outside
//! this crate and call into [`kernel_main`] once the processor is in
//! 32-bit protected mode with a stack set up.

#![cfg_attr(not(test), no_std)]

extern crate rlibc;

#[macro_use]
mod debug;
mod bare_bones;
mod config;
mod machine;

pub mod interrupts;
pub mod memory;
pub mod time;

use spin::Mutex;

use interrupts::sink::LoggingKeyboardSink;
use interrupts::trap::TrapFrame;
use memory::paging::MultibootInfo;
use memory::pmm::MemoryRegion;
use time::TickingClock;

/// The default collaborators wired up for this bring-up path: a tick
/// counter for the timer and a logging stand-in for a real keyboard
/// driver. Guarded by `spin::Mutex` even though the dispatcher's own
/// reentrancy is controlled purely by the processor's IF flag — this just
/// keeps `&mut` access to the sinks safe under the borrow checker.
static TIMER_SINK: Mutex<TickingClock> = Mutex::new(TickingClock);
static KEYBOARD_SINK: Mutex<LoggingKeyboardSink> = Mutex::new(LoggingKeyboardSink);

/// Entry point called by the assembly trampoline once the processor is in
/// protected mode with a valid stack, before paging and interrupts are set
/// up. Never returns.
///
/// # Safety
/// `multiboot_info` must be a valid physical pointer to a multiboot1
/// information record, as left behind by the bootloader.
#[no_mangle]
pub unsafe extern "C" fn kernel_main(multiboot_info: *const MultibootInfo, usable_memory: &[MemoryRegion]) -> ! {
    debug::init();
    log::info!("kernel_main entered");

    unsafe {
        let multiboot = &*multiboot_info;
        memory::bootstrap(multiboot, |physical| physical + config::KERNEL_VIRTUAL_BASE);
    }

    memory::init_frame_allocator(usable_memory);

    unsafe {
        interrupts::init();
        machine::enable_interrupts();
    }

    log::info!("bring-up complete");

    loop {
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack));
        }
    }
}

/// Called by each of the 32 exception trampolines (vectors 0-31) with the
/// frame they built on the stack. Never returns.
#[no_mangle]
pub extern "C" fn interrupt_handler(frame: &TrapFrame) -> ! {
    interrupts::dispatch_exception(frame)
}

/// Called by each of the 16 IRQ trampolines (vectors 32-47) with the frame
/// they built on the stack.
#[no_mangle]
pub extern "C" fn irq_handler(frame: &TrapFrame) {
    interrupts::dispatch_irq(frame, &mut *TIMER_SINK.lock(), &mut *KEYBOARD_SINK.lock())
}
