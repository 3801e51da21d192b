thread_local! {
    static IS_AUDIO_THREAD: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

pub(crate) fn is_audio_thread() -> bool {
    IS_AUDIO_THREAD.with(|x| x.get())
}

/// Mark this thread as the one driving [crate::BinauralEngine::process].
///
/// From then on, logging from this thread goes through the realtime-safe queue in [crate::logging] rather than
/// straight to the `log` crate.
#[inline(always)]
pub(crate) fn mark_audio_thread() {
    IS_AUDIO_THREAD.with(|x| x.replace(true));
}
