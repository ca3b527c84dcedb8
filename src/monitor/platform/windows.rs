//! Windows change listener using `NotifyUnicastIpAddressChange` and
//! `NotifyIpInterfaceChange`.

use crate::monitor::{ApiError, ChangeListener, NetworkEvent};
use std::pin::Pin;
use std::sync::mpsc;
use std::task::{Context, Poll};
use tokio::sync::mpsc as tokio_mpsc;
use tokio_stream::Stream;
use windows::Win32::Foundation::{HANDLE, NO_ERROR, WIN32_ERROR};
use windows::Win32::NetworkManagement::IpHelper::{
    CancelMibChangeNotify2, MIB_IPINTERFACE_ROW, MIB_NOTIFICATION_TYPE, MIB_UNICASTIPADDRESS_ROW,
    NotifyIpInterfaceChange, NotifyUnicastIpAddressChange,
};
use windows::Win32::Networking::WinSock::AF_UNSPEC;

/// Windows implementation of [`ChangeListener`].
///
/// Registers two IP Helper notifications when the stream is created:
/// unicast address changes map to [`NetworkEvent::AddressChanged`], interface
/// changes map to [`NetworkEvent::AvailabilityChanged`].
///
/// # Example
///
/// ```no_run
/// use nicwatch::monitor::ChangeListener;
/// use nicwatch::monitor::platform::WindowsChangeListener;
/// use tokio_stream::StreamExt;
///
/// # async fn example() {
/// let mut stream = WindowsChangeListener::new().into_stream();
///
/// while let Some(result) = stream.next().await {
///     match result {
///         Ok(event) => println!("{event}"),
///         Err(e) => {
///             eprintln!("Listener error: {e}");
///             break;
///         }
///     }
/// }
/// # }
/// ```
#[derive(Debug, Default)]
pub struct WindowsChangeListener {
    _private: (),
}

impl WindowsChangeListener {
    /// Creates a new listener. Nothing is registered until `into_stream`.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl ChangeListener for WindowsChangeListener {
    type Stream = WindowsChangeStream;

    fn into_stream(self) -> Self::Stream {
        WindowsChangeStream::new()
    }
}

/// Stream of change notifications from the IP Helper API.
pub struct WindowsChangeStream {
    receiver: tokio_mpsc::UnboundedReceiver<Result<NetworkEvent, ApiError>>,
    /// Registrations, cancelled on drop.
    handles: Vec<NotificationHandle>,
    terminated: bool,
}

impl std::fmt::Debug for WindowsChangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsChangeStream")
            .field("terminated", &self.terminated)
            .field("registrations", &self.handles.len())
            .finish_non_exhaustive()
    }
}

/// RAII wrapper for one notification registration.
///
/// Cancels the registration when dropped, then reclaims the leaked
/// `CallbackContext`.
struct NotificationHandle {
    handle: HANDLE,
    context_ptr: *mut CallbackContext,
}

impl Drop for NotificationHandle {
    fn drop(&mut self) {
        // SAFETY: We own this handle; it was returned by a Notify* call.
        let _ = unsafe { CancelMibChangeNotify2(self.handle) };

        // SAFETY: Once CancelMibChangeNotify2 returns the callback no longer
        // fires, so the context can be reclaimed. Dropping it drops the sender.
        drop(unsafe { Box::from_raw(self.context_ptr) });
    }
}

// SAFETY: CancelMibChangeNotify2 may be called from any thread.
unsafe impl Send for NotificationHandle {}

/// Context passed to the OS callbacks.
struct CallbackContext {
    sender: mpsc::Sender<NetworkEvent>,
}

impl WindowsChangeStream {
    fn new() -> Self {
        // OS callbacks run on the Windows thread pool and only enqueue.
        let (sync_tx, sync_rx) = mpsc::channel::<NetworkEvent>();
        let (async_tx, async_rx) = tokio_mpsc::unbounded_channel();

        // Bridge thread exits once every registration has been cancelled.
        let bridge_tx = async_tx.clone();
        std::thread::spawn(move || {
            while let Ok(event) = sync_rx.recv() {
                if bridge_tx.send(Ok(event)).is_err() {
                    break;
                }
            }
        });

        let registrations = register_address_change(sync_tx.clone())
            .and_then(|address| Ok(vec![address, register_interface_change(sync_tx)?]));

        let (handles, terminated) = match registrations {
            Ok(handles) => (handles, false),
            Err(e) => {
                let _ = async_tx.send(Err(e));
                (Vec::new(), false)
            }
        };

        Self {
            receiver: async_rx,
            handles,
            terminated,
        }
    }
}

impl Stream for WindowsChangeStream {
    type Item = Result<NetworkEvent, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.receiver).poll_recv(cx) {
            Poll::Ready(Some(Ok(event))) => Poll::Ready(Some(Ok(event))),
            Poll::Ready(Some(Err(e))) => {
                self.terminated = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(Some(Err(ApiError::Stopped)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

fn into_context(sender: mpsc::Sender<NetworkEvent>) -> *mut CallbackContext {
    Box::into_raw(Box::new(CallbackContext { sender }))
}

/// Turns a registration result into a handle, reclaiming the context on failure.
fn finish_registration(
    result: WIN32_ERROR,
    handle: HANDLE,
    context_ptr: *mut CallbackContext,
) -> Result<NotificationHandle, ApiError> {
    if result != NO_ERROR {
        // SAFETY: Registration failed, so the callback never sees the context.
        drop(unsafe { Box::from_raw(context_ptr) });
        return Err(windows::core::Error::from(WIN32_ERROR(result.0)).into());
    }
    Ok(NotificationHandle {
        handle,
        context_ptr,
    })
}

/// # Coverage Note
///
/// Excluded from coverage: requires real API registration.
#[cfg(not(tarpaulin_include))]
fn register_address_change(
    sender: mpsc::Sender<NetworkEvent>,
) -> Result<NotificationHandle, ApiError> {
    let context_ptr = into_context(sender);
    let mut handle = HANDLE::default();

    // SAFETY: Valid callback and context; the context outlives the
    // registration because NotificationHandle cancels before freeing it.
    let result = unsafe {
        NotifyUnicastIpAddressChange(
            AF_UNSPEC,
            Some(unicast_address_callback),
            Some(context_ptr.cast::<std::ffi::c_void>()),
            false,
            &raw mut handle,
        )
    };

    finish_registration(result, handle, context_ptr)
}

/// # Coverage Note
///
/// Excluded from coverage: requires real API registration.
#[cfg(not(tarpaulin_include))]
fn register_interface_change(
    sender: mpsc::Sender<NetworkEvent>,
) -> Result<NotificationHandle, ApiError> {
    let context_ptr = into_context(sender);
    let mut handle = HANDLE::default();

    // SAFETY: As in `register_address_change`.
    let result = unsafe {
        NotifyIpInterfaceChange(
            AF_UNSPEC,
            Some(ip_interface_callback),
            Some(context_ptr.cast::<std::ffi::c_void>()),
            false,
            &raw mut handle,
        )
    };

    finish_registration(result, handle, context_ptr)
}

/// Sends `event` through the context's channel.
///
/// # Safety
///
/// `caller_context` must be null or point to a live `CallbackContext`.
unsafe fn enqueue(caller_context: *const std::ffi::c_void, event: NetworkEvent) {
    if caller_context.is_null() {
        return;
    }
    // SAFETY: Guaranteed by the caller.
    let context = unsafe { &*(caller_context.cast::<CallbackContext>()) };
    // Receiver may already be gone during teardown.
    let _ = context.sender.send(event);
}

#[cfg(not(tarpaulin_include))]
unsafe extern "system" fn unicast_address_callback(
    caller_context: *const std::ffi::c_void,
    _row: *const MIB_UNICASTIPADDRESS_ROW,
    _notification_type: MIB_NOTIFICATION_TYPE,
) {
    // SAFETY: The context was registered in `register_address_change`.
    unsafe { enqueue(caller_context, NetworkEvent::AddressChanged) };
}

#[cfg(not(tarpaulin_include))]
unsafe extern "system" fn ip_interface_callback(
    caller_context: *const std::ffi::c_void,
    _row: *const MIB_IPINTERFACE_ROW,
    _notification_type: MIB_NOTIFICATION_TYPE,
) {
    // SAFETY: The context was registered in `register_interface_change`.
    unsafe { enqueue(caller_context, NetworkEvent::AvailabilityChanged) };
}
