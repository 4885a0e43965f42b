// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows Image Acquisition bridge via the `windows` crate.
//
// Enumeration goes through the WIA device manager; every device info's
// property storage carries its ID and friendly name. A device connects to a
// root item whose children are the scan sources (flatbed first). A transfer
// asks the item for a file in the requested format, reads it back and
// deletes it.
//
// This module is cfg-gated to Windows. COM is initialised apartment-threaded
// for the thread that creates the bridge; all calls must stay on it.

#![cfg(windows)]

use syscan_core::error::{Result, SyscanError};
use syscan_core::types::{DeviceInfo, ItemProperty, TransferFormat};
use tracing::{debug, info, instrument, warn};
use windows::Win32::Devices::ImageAcquisition::{
    IEnumWIA_DEV_INFO, IEnumWiaItem, IWiaDataCallback, IWiaDataTransfer, IWiaDevMgr,
    IWiaItem, IWiaPropertyStorage, WIA_DEVINFO_ENUM_LOCAL, WIA_DIP_DEV_ID, WIA_DIP_DEV_NAME,
    WIA_IPA_FORMAT, WIA_IPA_TYMED, WIA_IPS_XRES, WIA_IPS_YRES, WiaDevMgr,
};
use windows::Win32::System::Com::StructuredStorage::{
    InitPropVariantFromCLSID, PROPSPEC, PROPSPEC_0, PRSPEC_PROPID, PropVariantToBSTR,
};
use windows::Win32::System::Com::{
    CLSCTX_LOCAL_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    CoUninitialize, STGMEDIUM, TYMED_FILE,
};
use windows::Win32::System::Ole::ReleaseStgMedium;
use windows::core::{BSTR, GUID, PROPVARIANT};

use crate::traits::*;

/// First property ID available for named properties; WIA ignores names.
const PID_FIRST_USABLE: u32 = 2;

/// Balances the `CoInitializeEx` done in [`WiaBridge::new`].
struct ComApartment;

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Scanner access through the WIA device manager.
pub struct WiaBridge {
    manager: IWiaDevMgr,
    _apartment: ComApartment,
}

impl WiaBridge {
    /// Initialise COM on this thread and create the device manager.
    pub fn new() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(wia_error("COM initialisation"))?;
        let apartment = ComApartment;

        let manager: IWiaDevMgr = unsafe { CoCreateInstance(&WiaDevMgr, None, CLSCTX_LOCAL_SERVER) }
            .map_err(wia_error("WIA device manager"))?;

        info!("WIA device manager ready");
        Ok(Self {
            manager,
            _apartment: apartment,
        })
    }
}

impl ImagingSubsystem for WiaBridge {
    fn platform_name(&self) -> &str {
        "Windows Image Acquisition"
    }

    #[instrument(skip(self))]
    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        let infos: IEnumWIA_DEV_INFO =
            unsafe { self.manager.EnumDeviceInfo(WIA_DEVINFO_ENUM_LOCAL as i32) }
                .map_err(wia_error("device enumeration"))?;

        let mut devices = Vec::new();
        loop {
            let mut storage: Option<IWiaPropertyStorage> = None;
            let mut fetched = 0u32;
            unsafe { infos.Next(1, &mut storage, &mut fetched) }
                .ok()
                .map_err(wia_error("device enumeration"))?;
            let Some(storage) = storage.filter(|_| fetched == 1) else {
                break;
            };

            let id = read_string(&storage, WIA_DIP_DEV_ID)?;
            let name = read_string(&storage, WIA_DIP_DEV_NAME)?;
            debug!(%id, %name, "WIA device found");
            devices.push(DeviceInfo { id, name });
        }

        info!(count = devices.len(), "WIA devices enumerated");
        Ok(devices)
    }

    fn connect(&self, device_id: &str) -> Result<Box<dyn ScannerConnection>> {
        let root: IWiaItem = unsafe { self.manager.CreateDevice(&BSTR::from(device_id)) }
            .map_err(|err| SyscanError::DeviceConnection(err.message().to_string()))?;
        info!(device_id, "connected to WIA device");
        Ok(Box::new(WiaConnection { root }))
    }
}

struct WiaConnection {
    root: IWiaItem,
}

impl ScannerConnection for WiaConnection {
    fn items(&self) -> Result<Vec<Box<dyn ScanItem>>> {
        let children: IEnumWiaItem =
            unsafe { self.root.EnumChildItems() }.map_err(wia_error("item enumeration"))?;

        let mut items: Vec<Box<dyn ScanItem>> = Vec::new();
        loop {
            let mut item: Option<IWiaItem> = None;
            let mut fetched = 0u32;
            unsafe { children.Next(1, &mut item, &mut fetched) }
                .ok()
                .map_err(wia_error("item enumeration"))?;
            match item.filter(|_| fetched == 1) {
                Some(item) => items.push(Box::new(WiaItem { item })),
                None => break,
            }
        }
        Ok(items)
    }
}

struct WiaItem {
    item: IWiaItem,
}

impl WiaItem {
    fn properties(&self) -> Result<IWiaPropertyStorage> {
        windows::core::Interface::cast(&self.item).map_err(wia_error("item properties"))
    }
}

impl ScanItem for WiaItem {
    fn set_property(&mut self, property: ItemProperty, value: i32) -> Result<()> {
        let id = match property {
            ItemProperty::HorizontalResolution => WIA_IPS_XRES,
            ItemProperty::VerticalResolution => WIA_IPS_YRES,
        };
        write_property(&self.properties()?, id, &PROPVARIANT::from(value))
            .map_err(|err| SyscanError::Bridge(format!("{}: {err}", property.name())))
    }

    #[instrument(skip(self))]
    fn transfer(&mut self, format: TransferFormat) -> Result<Vec<u8>> {
        let storage = self.properties()?;
        let format_guid = parse_format_id(format.format_id())?;
        let format_value =
            unsafe { InitPropVariantFromCLSID(&format_guid) }.map_err(wia_error("transfer format"))?;
        write_property(&storage, WIA_IPA_FORMAT, &format_value)?;
        write_property(&storage, WIA_IPA_TYMED, &PROPVARIANT::from(TYMED_FILE.0))?;

        let transfer: IWiaDataTransfer =
            windows::core::Interface::cast(&self.item).map_err(wia_error("data transfer"))?;

        let mut medium = STGMEDIUM {
            tymed: TYMED_FILE.0 as u32,
            ..Default::default()
        };
        unsafe { transfer.idtGetData(&mut medium, None::<&IWiaDataCallback>) }
            .ok()
            .map_err(|err| SyscanError::Bridge(format!("transfer failed: {}", err.message())))?;

        let file = unsafe { medium.u.lpszFileName.to_string() }
            .map_err(|err| SyscanError::Bridge(format!("transfer file name: {err}")));
        let bytes = file.and_then(|path| {
            let data = std::fs::read(&path)?;
            if let Err(err) = std::fs::remove_file(&path) {
                warn!(%path, %err, "WIA transfer file left behind");
            }
            Ok(data)
        });
        unsafe { ReleaseStgMedium(&mut medium) };

        let bytes = bytes?;
        info!(bytes = bytes.len(), ?format, "frame transferred");
        Ok(bytes)
    }
}

// -- Helpers ------------------------------------------------------------------

fn wia_error(context: &'static str) -> impl Fn(windows::core::Error) -> SyscanError {
    move |err| SyscanError::Bridge(format!("{context}: {}", err.message()))
}

fn propid_spec(id: u32) -> PROPSPEC {
    PROPSPEC {
        ulKind: PRSPEC_PROPID,
        Anonymous: PROPSPEC_0 { propid: id },
    }
}

fn read_string(storage: &IWiaPropertyStorage, id: u32) -> Result<String> {
    let spec = propid_spec(id);
    let mut value = PROPVARIANT::default();
    unsafe { storage.ReadMultiple(1, &spec, &mut value) }.map_err(wia_error("property read"))?;
    let text = unsafe { PropVariantToBSTR(&value) }.map_err(wia_error("property read"))?;
    Ok(text.to_string())
}

fn write_property(storage: &IWiaPropertyStorage, id: u32, value: &PROPVARIANT) -> Result<()> {
    let spec = propid_spec(id);
    unsafe { storage.WriteMultiple(1, &spec, value, PID_FIRST_USABLE) }
        .map_err(wia_error("property write"))
}

/// `{B96B3CAB-...}` to a GUID.
fn parse_format_id(id: &str) -> Result<GUID> {
    GUID::try_from(id.trim_start_matches('{').trim_end_matches('}'))
        .map_err(|_| SyscanError::Bridge(format!("malformed format id {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Devices::ImageAcquisition::{WiaImgFmt_BMP, WiaImgFmt_PNG};

    #[test]
    fn format_ids_match_wia_constants() {
        assert_eq!(parse_format_id(TransferFormat::Bmp.format_id()).unwrap(), WiaImgFmt_BMP);
        assert_eq!(parse_format_id(TransferFormat::Png.format_id()).unwrap(), WiaImgFmt_PNG);
    }

    #[test]
    fn malformed_format_id_is_a_bridge_error() {
        assert!(matches!(
            parse_format_id("{not-a-guid}"),
            Err(SyscanError::Bridge(_))
        ));
    }
}
