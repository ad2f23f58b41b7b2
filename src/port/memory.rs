//! In-process input port with virtual devices
//!
//! Frames staged with [`MemoryInputPort::stage_frame`] only become visible
//! after the next `pump_events`, matching how real backends buffer events.

use super::{DeviceDescriptor, DeviceHandle, InputKind, PortError, RawFrame, RawInputPort};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug)]
struct VirtualDevice {
    name: String,
    current: RawFrame,
    pending: Option<RawFrame>,
}

#[derive(Debug, Default)]
struct MemoryPortState {
    // Slot position is the device index; detached slots stay empty
    devices: Vec<Option<VirtualDevice>>,
    open: HashSet<DeviceHandle>,
    next_serial: u64,
    pump_count: u64,
    close_count: u64,
}

impl MemoryPortState {
    fn device(&self, handle: DeviceHandle) -> Result<&VirtualDevice, PortError> {
        if !self.open.contains(&handle) {
            return Err(PortError::HandleClosed(handle));
        }
        self.devices
            .get(handle.index())
            .and_then(Option::as_ref)
            .ok_or(PortError::Disconnected(handle.index()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryInputPort {
    state: Mutex<MemoryPortState>,
}

impl MemoryInputPort {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryPortState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plugs in a virtual device and returns its index
    pub fn attach(&self, name: impl Into<String>, frame: RawFrame) -> usize {
        let mut state = self.lock();
        let name = name.into();
        let index = state.devices.len();
        info!("Attaching virtual device {} at index {}", name, index);
        state.devices.push(Some(VirtualDevice {
            name,
            current: frame,
            pending: None,
        }));
        index
    }

    /// Queues a frame that becomes readable after the next `pump_events`
    pub fn stage_frame(&self, index: usize, frame: RawFrame) -> Result<(), PortError> {
        let mut state = self.lock();
        let device = state
            .devices
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(PortError::NoSuchDevice(index))?;
        device.pending = Some(frame);
        Ok(())
    }

    /// Unplugs a device; open handles to it start failing with `Disconnected`
    pub fn detach(&self, index: usize) {
        let mut state = self.lock();
        if let Some(slot) = state.devices.get_mut(index) {
            if slot.take().is_some() {
                info!("Detached virtual device {}", index);
            }
        }
    }

    /// Invalidates every open handle to a device, as a backend would after
    /// releasing it behind the caller's back
    pub fn revoke_handles(&self, index: usize) {
        let mut state = self.lock();
        state.open.retain(|handle| handle.index() != index);
    }

    pub fn open_handle_count(&self) -> usize {
        self.lock().open.len()
    }

    pub fn close_count(&self) -> u64 {
        self.lock().close_count
    }

    pub fn pump_count(&self) -> u64 {
        self.lock().pump_count
    }
}

impl RawInputPort for MemoryInputPort {
    fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, PortError> {
        let state = self.lock();
        Ok(state
            .devices
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|device| describe(index, device)))
            .collect())
    }

    fn open(&self, index: usize) -> Result<DeviceHandle, PortError> {
        let mut state = self.lock();
        if !matches!(state.devices.get(index), Some(Some(_))) {
            return Err(PortError::NoSuchDevice(index));
        }
        state.next_serial += 1;
        let handle = DeviceHandle::new(index, state.next_serial);
        state.open.insert(handle);
        debug!("Opened virtual device handle {}", handle);
        Ok(handle)
    }

    fn pump_events(&self) {
        let mut state = self.lock();
        state.pump_count += 1;
        for device in state.devices.iter_mut().flatten() {
            if let Some(frame) = device.pending.take() {
                device.current = frame;
            }
        }
    }

    fn describe(&self, handle: DeviceHandle) -> Result<DeviceDescriptor, PortError> {
        let state = self.lock();
        let device = state.device(handle)?;
        Ok(describe(handle.index(), device))
    }

    fn read_axis(&self, handle: DeviceHandle, axis: usize) -> Result<f32, PortError> {
        let state = self.lock();
        let device = state.device(handle)?;
        device
            .current
            .axes
            .get(axis)
            .copied()
            .ok_or(out_of_range(handle, InputKind::Axis, axis))
    }

    fn read_button(&self, handle: DeviceHandle, button: usize) -> Result<bool, PortError> {
        let state = self.lock();
        let device = state.device(handle)?;
        device
            .current
            .buttons
            .get(button)
            .copied()
            .ok_or(out_of_range(handle, InputKind::Button, button))
    }

    fn read_hat(&self, handle: DeviceHandle, hat: usize) -> Result<(i8, i8), PortError> {
        let state = self.lock();
        let device = state.device(handle)?;
        device
            .current
            .hats
            .get(hat)
            .copied()
            .ok_or(out_of_range(handle, InputKind::Hat, hat))
    }

    fn close(&self, handle: DeviceHandle) {
        let mut state = self.lock();
        if state.open.remove(&handle) {
            state.close_count += 1;
            debug!("Closed virtual device handle {}", handle);
        }
    }
}

fn describe(index: usize, device: &VirtualDevice) -> DeviceDescriptor {
    DeviceDescriptor {
        index,
        name: device.name.clone(),
        num_axes: device.current.axes.len(),
        num_buttons: device.current.buttons.len(),
        num_hats: device.current.hats.len(),
        num_balls: 0,
    }
}

fn out_of_range(handle: DeviceHandle, kind: InputKind, index: usize) -> PortError {
    PortError::InputOutOfRange {
        device: handle.index(),
        kind,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(x: f32) -> RawFrame {
        RawFrame::new(vec![x, 0.0], vec![false; 3], vec![(0, 0)])
    }

    #[test]
    fn staged_frames_need_a_pump() {
        let port = MemoryInputPort::new();
        let index = port.attach("pad", frame(0.1));
        let handle = port.open(index).unwrap();

        port.stage_frame(index, frame(0.9)).unwrap();
        assert_eq!(port.read_axis(handle, 0).unwrap(), 0.1);

        port.pump_events();
        assert_eq!(port.read_axis(handle, 0).unwrap(), 0.9);
        assert_eq!(port.pump_count(), 1);
    }

    #[test]
    fn closed_and_revoked_handles_fail() {
        let port = MemoryInputPort::new();
        let index = port.attach("pad", frame(0.0));
        let first = port.open(index).unwrap();
        let second = port.open(index).unwrap();
        assert_ne!(first, second);

        port.close(first);
        port.close(first);
        assert_eq!(port.close_count(), 1);
        assert_eq!(port.read_axis(first, 0), Err(PortError::HandleClosed(first)));

        port.revoke_handles(index);
        assert_eq!(port.open_handle_count(), 0);
        assert!(matches!(
            port.read_button(second, 0),
            Err(PortError::HandleClosed(_))
        ));
    }

    #[test]
    fn detached_device_disappears() {
        let port = MemoryInputPort::new();
        let first = port.attach("first", frame(0.0));
        let second = port.attach("second", frame(0.0));
        let handle = port.open(first).unwrap();

        port.detach(first);
        let devices = port.enumerate_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].index, second);
        assert_eq!(port.read_hat(handle, 0), Err(PortError::Disconnected(first)));
        assert_eq!(port.open(first), Err(PortError::NoSuchDevice(first)));
    }

    #[test]
    fn read_frame_collects_every_input() {
        let port = MemoryInputPort::new();
        let index = port.attach("pad", frame(0.5));
        let handle = port.open(index).unwrap();
        let raw = port.read_frame(handle).unwrap();
        assert_eq!(raw, frame(0.5));
        assert_eq!(
            port.read_axis(handle, 7),
            Err(PortError::InputOutOfRange {
                device: index,
                kind: InputKind::Axis,
                index: 7
            })
        );
    }

    #[test]
    fn pumped_raw_frame_serializes_in_index_order() {
        let port = MemoryInputPort::new();
        let index = port.attach("pad", frame(0.0));
        let handle = port.open(index).unwrap();
        port.stage_frame(
            index,
            RawFrame::new(vec![0.5, -1.0], vec![false, true], vec![(-1, 1)]),
        )
        .unwrap();

        port.pump_events();
        let json = serde_json::to_value(port.read_frame(handle).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "axes": [0.5, -1.0],
                "buttons": [false, true],
                "hats": [[-1, 1]],
            })
        );
    }
}
