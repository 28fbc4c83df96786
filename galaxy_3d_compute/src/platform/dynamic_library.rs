/// Dynamic library probing for hardware backend detection
///
/// A backend counts as present when one of its candidate shared libraries
/// can be opened and exposes a well-known entry point. The library is
/// closed again immediately; no symbol is ever called.

use libloading::Library;

/// Whether `library` can be opened and exports `symbol`
pub fn exposes_symbol(library: &str, symbol: &str) -> bool {
    // SAFETY: opening a system driver runs its initializers. The probed
    // names are the vendor ICD/loader libraries, which are built to be loaded
    // by arbitrary processes.
    let lib = match unsafe { Library::new(library) } {
        Ok(lib) => lib,
        Err(_) => return false,
    };
    // SAFETY: the symbol is only resolved, never called, so the declared
    // signature is irrelevant.
    let found = unsafe { lib.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }.is_ok();
    found
}

/// Whether any library in `candidates` can be opened and exports `symbol`
pub fn any_exposes_symbol(candidates: &[&str], symbol: &str) -> bool {
    candidates.iter().any(|library| exposes_symbol(library, symbol))
}

#[cfg(test)]
#[path = "dynamic_library_tests.rs"]
mod tests;
