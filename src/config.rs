//! Compile-time tunables shared by the memory and interrupt subsystems.
//!
//! There is no runtime configuration surface for this core (no CLI, no
//! files, no environment); these constants are its closest analogue and are
//! grouped here because several modules (paging, the PIC remap, the PIT,
//! the frame allocator) share the same higher-half layout and timer
//! frequency.

/// Start of kernel-space virtual addresses: the top 1 GiB of a 32-bit
/// address space.
pub const KERNEL_VIRTUAL_BASE: u32 = 0xC000_0000;

/// Size of a physical/virtual page.
pub const PAGE_SIZE: u32 = 4096;

/// Entries in a page directory, or in a single page table.
pub const ENTRIES_PER_TABLE: usize = 1024;

/// Page tables needed to cover the top 1 GiB of address space
/// (`256 * 1024 * PAGE_SIZE == 1 GiB`).
pub const KERNEL_PAGE_TABLE_COUNT: usize = 256;

/// First page-directory index the kernel populates
/// (`1024 - KERNEL_PAGE_TABLE_COUNT == 768`).
pub const KERNEL_DIRECTORY_BASE_INDEX: usize = ENTRIES_PER_TABLE - KERNEL_PAGE_TABLE_COUNT;

/// Capacity of the physical frame table: one entry per 4 KiB page across
/// 4 GiB of addressable physical memory.
pub const MAX_FRAME_TABLE_ENTRIES: usize = 1024 * 1024;

/// Base oscillator frequency of the programmable interval timer.
pub const PIT_BASE_HZ: u32 = 1_193_180;

/// Tick rate the bootstrap path programs the PIT to.
pub const PIT_DEFAULT_HZ: u32 = 100;

/// First IDT vector device IRQs are remapped onto.
pub const IRQ_BASE_VECTOR: u8 = 32;

/// Number of gates in the IDT.
pub const IDT_ENTRY_COUNT: usize = 256;

/// `0x8E`: present, ring 0, 32-bit interrupt gate.
pub const INTERRUPT_GATE_TYPE_ATTR: u8 = 0x8E;

/// Kernel code segment selector, as installed by the (out of scope) GDT setup.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;
