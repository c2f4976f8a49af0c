//! The fixed entry-point table of a core and its fail-closed bind.

use or_abi as abi;
use or_core::error::LoadError;

/// Untyped entry-point address as it comes out of the dynamic linker.
pub type RawEntryFn = unsafe extern "C" fn();

/// The seventeen entry points every core must export, by ABI name.
pub const REQUIRED_SYMBOLS: [&str; 17] = [
    "retro_init",
    "retro_deinit",
    "retro_run",
    "retro_reset",
    "retro_get_system_info",
    "retro_load_game",
    "retro_unload_game",
    "retro_set_environment",
    "retro_set_video_refresh",
    "retro_set_audio_sample",
    "retro_set_audio_sample_batch",
    "retro_set_input_poll",
    "retro_set_input_state",
    "retro_serialize",
    "retro_serialize_size",
    "retro_unserialize",
    "retro_get_system_av_info",
];

/// Anything that can resolve ABI entry points by name. `CoreLibrary` is the
/// real implementation; tests substitute an in-memory table so bind failures
/// can be exercised without fixture shared objects.
pub trait SymbolSource {
    fn lookup(&self, name: &'static str) -> Option<RawEntryFn>;
}

/// Typed function table of the required core entry points.
///
/// Built exactly once per load by [`CoreSymbols::bind`]; a constructed value
/// guarantees every entry was present in the source, so no field can hold a
/// null. Invoking any entry is unsafe and additionally subject to the
/// lifecycle preconditions enforced by the session layer.
#[derive(Clone, Copy)]
pub struct CoreSymbols {
    pub init: abi::RetroInitFn,
    pub deinit: abi::RetroDeinitFn,
    pub run: abi::RetroRunFn,
    pub reset: abi::RetroResetFn,
    pub get_system_info: abi::RetroGetSystemInfoFn,
    pub load_game: abi::RetroLoadGameFn,
    pub unload_game: abi::RetroUnloadGameFn,
    pub set_environment: abi::RetroSetEnvironmentFn,
    pub set_video_refresh: abi::RetroSetVideoRefreshFn,
    pub set_audio_sample: abi::RetroSetAudioSampleFn,
    pub set_audio_sample_batch: abi::RetroSetAudioSampleBatchFn,
    pub set_input_poll: abi::RetroSetInputPollFn,
    pub set_input_state: abi::RetroSetInputStateFn,
    pub serialize: abi::RetroSerializeFn,
    pub serialize_size: abi::RetroSerializeSizeFn,
    pub unserialize: abi::RetroUnserializeFn,
    pub get_system_av_info: abi::RetroGetSystemAvInfoFn,
}

impl CoreSymbols {
    /// Resolve every required entry point from `source`, failing closed on
    /// the first missing name. Either a complete table comes back or none
    /// does; a missing symbol can never surface later as a null call.
    pub fn bind(source: &dyn SymbolSource) -> Result<Self, LoadError> {
        // Safety: each address is cast to the signature the ABI fixes for
        // its name; the names are exactly the required export set.
        unsafe {
            Ok(Self {
                init: resolve(source, "retro_init")?,
                deinit: resolve(source, "retro_deinit")?,
                run: resolve(source, "retro_run")?,
                reset: resolve(source, "retro_reset")?,
                get_system_info: resolve(source, "retro_get_system_info")?,
                load_game: resolve(source, "retro_load_game")?,
                unload_game: resolve(source, "retro_unload_game")?,
                set_environment: resolve(source, "retro_set_environment")?,
                set_video_refresh: resolve(source, "retro_set_video_refresh")?,
                set_audio_sample: resolve(source, "retro_set_audio_sample")?,
                set_audio_sample_batch: resolve(source, "retro_set_audio_sample_batch")?,
                set_input_poll: resolve(source, "retro_set_input_poll")?,
                set_input_state: resolve(source, "retro_set_input_state")?,
                serialize: resolve(source, "retro_serialize")?,
                serialize_size: resolve(source, "retro_serialize_size")?,
                unserialize: resolve(source, "retro_unserialize")?,
                get_system_av_info: resolve(source, "retro_get_system_av_info")?,
            })
        }
    }
}

/// Look up `name` and cast the address to the entry's typed signature.
///
/// # Safety
/// `F` must be the function-pointer type the ABI declares for `name`.
unsafe fn resolve<F: Copy>(
    source: &dyn SymbolSource,
    name: &'static str,
) -> Result<F, LoadError> {
    let raw = source.lookup(name).ok_or(LoadError::MissingSymbol(name))?;
    // fn-pointer to fn-pointer cast, same size on every supported target
    Ok(std::mem::transmute_copy(&raw))
}
