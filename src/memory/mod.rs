//! Virtual memory bootstrap and the physical page-frame allocator.
//!
//! This is the hard core of the bring-up path: building the kernel's own
//! page tables and handing out physical frames are the two things every
//! later subsystem assumes already work.

pub mod entry;
pub mod paging;
pub mod pmm;

use spin::Mutex;

use crate::config::MAX_FRAME_TABLE_ENTRIES;
use paging::{KernelPageTables, MultibootInfo, PageDirectory};
use pmm::PageFrameManager;

/// The kernel page directory. Lives for the lifetime of the kernel; only
/// the bootstrap path writes to it.
static KERNEL_DIRECTORY: Mutex<PageDirectory> = Mutex::new(PageDirectory::new());

/// The kernel's 256-table page-table array.
static KERNEL_PAGE_TABLES: Mutex<KernelPageTables> = Mutex::new(KernelPageTables::new());

/// The physical frame allocator, sized for 4 GiB of addressable RAM.
static FRAME_MANAGER: Mutex<PageFrameManager<MAX_FRAME_TABLE_ENTRIES>> =
    Mutex::new(PageFrameManager::new());

/// Run the full virtual memory bootstrap and load CR3.
///
/// `identity_offset_translate` turns a raw bootloader physical pointer into
/// one this core can dereference before the kernel's own mapping exists.
///
/// # Safety
/// Must be called exactly once, before any other code dereferences a
/// higher-half virtual address, and `multiboot` must point at a valid
/// multiboot1 information record.
pub unsafe fn bootstrap(multiboot: &MultibootInfo, identity_offset_translate: impl Fn(u32) -> u32) {
    let mut tables = KERNEL_PAGE_TABLES.lock();
    let mut directory = KERNEL_DIRECTORY.lock();

    paging::build_directory(&mut directory, &tables);
    paging::identity_map_low_memory(&mut tables);
    paging::map_kernel_image(&mut tables, multiboot, identity_offset_translate);

    let directory_physical = &*directory as *const PageDirectory as u32;
    unsafe {
        crate::machine::load_page_directory(directory_physical);
    }

    log::info!("paging enabled");
}

/// Hand the frame allocator the bootloader's usable memory map.
pub fn init_frame_allocator(regions: &[pmm::MemoryRegion]) {
    FRAME_MANAGER.lock().initialize(regions);
    log::info!(
        "physical memory inited - {} frames",
        FRAME_MANAGER.lock().num_frames()
    );
}

/// Allocate one physical frame.
pub fn request_frame() -> Result<u32, pmm::MemoryError> {
    FRAME_MANAGER.lock().request_frame()
}

/// Mark a specific frame in-use without going through the round-robin
/// cursor, e.g. to carve out frames already occupied by the kernel image.
pub fn reserve_frame(address: u32) -> Result<(), pmm::MemoryError> {
    FRAME_MANAGER.lock().reserve_frame(address)
}

/// Release a previously allocated or reserved frame.
pub fn free_frame(address: u32) -> Result<(), pmm::MemoryError> {
    FRAME_MANAGER.lock().free_frame(address)
}
