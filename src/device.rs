use std::collections::HashSet;

use anyhow::{anyhow, Result};
use log::*;
use thiserror::Error;
use vulkanalia::prelude::v1_2::*;
use vulkanalia::vk::KhrSurfaceExtension;

use crate::appdata::AppData;
use crate::config::{DEVICE_EXTENSIONS, VALIDATION_LAYER};

#[derive(Debug, Error)]
#[error("Missing {0}.")]
pub struct SuitabilityError(pub &'static str);

/// Queue family indices for graphics work and surface presentation. Only
/// constructed when both families exist; the two may name the same family.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyIndices {
    pub unsafe fn get(
        instance: &Instance,
        data: &AppData,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let properties = instance.get_physical_device_queue_family_properties(physical_device);

        let mut graphics = None;
        let mut present = None;
        for (index, family) in properties.iter().enumerate() {
            if graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                graphics = Some(index as u32);
            }
            if present.is_none()
                && instance.get_physical_device_surface_support_khr(
                    physical_device,
                    index as u32,
                    data.surface,
                )?
            {
                present = Some(index as u32);
            }
            if graphics.is_some() && present.is_some() {
                break;
            }
        }

        if let (Some(graphics), Some(present)) = (graphics, present) {
            Ok(Self { graphics, present })
        } else {
            Err(anyhow!(SuitabilityError("required queue families")))
        }
    }
}

/// Surface capabilities of a physical device, queried once per candidate.
#[derive(Clone, Debug)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    pub unsafe fn get(
        instance: &Instance,
        data: &AppData,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        Ok(Self {
            capabilities: instance
                .get_physical_device_surface_capabilities_khr(physical_device, data.surface)?,
            formats: instance
                .get_physical_device_surface_formats_khr(physical_device, data.surface)?,
            present_modes: instance
                .get_physical_device_surface_present_modes_khr(physical_device, data.surface)?,
        })
    }
}

/// Picks the highest-scoring suitable physical device. Ties keep the device
/// seen first during enumeration.
pub unsafe fn pick_physical_device(instance: &Instance, data: &mut AppData) -> Result<()> {
    let mut candidates = Vec::new();
    for physical_device in instance.enumerate_physical_devices()? {
        let properties = instance.get_physical_device_properties(physical_device);
        match check_physical_device(instance, data, physical_device) {
            Err(error) => warn!("Skipping physical device (`{}`): {}", properties.device_name, error),
            Ok(()) => candidates.push((physical_device, device_type_score(properties.device_type))),
        }
    }

    match select_best(candidates) {
        Some(physical_device) => {
            let properties = instance.get_physical_device_properties(physical_device);
            info!("Selected physical device (`{}`).", properties.device_name);
            data.physical_device = physical_device;
            Ok(())
        }
        None => Err(anyhow!("Failed to find a suitable physical device.")),
    }
}

/// Scores a suitable device by category: discrete GPUs beat integrated ones
/// beat everything else.
fn device_type_score(device_type: vk::PhysicalDeviceType) -> u8 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 3,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
        _ => 1,
    }
}

/// Returns the first candidate with the maximal score, if any.
fn select_best<T: Copy>(candidates: impl IntoIterator<Item = (T, u8)>) -> Option<T> {
    let mut best: Option<(T, u8)> = None;
    for (candidate, score) in candidates {
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

unsafe fn check_physical_device(
    instance: &Instance,
    data: &AppData,
    physical_device: vk::PhysicalDevice,
) -> Result<()> {
    QueueFamilyIndices::get(instance, data, physical_device)?;
    check_physical_device_extensions(instance, physical_device)?;

    let support = SwapchainSupport::get(instance, data, physical_device)?;
    if support.formats.is_empty() || support.present_modes.is_empty() {
        return Err(anyhow!(SuitabilityError("sufficient swapchain support")));
    }

    let features = instance.get_physical_device_features(physical_device);
    if features.sampler_anisotropy != vk::TRUE {
        return Err(anyhow!(SuitabilityError("sampler anisotropy")));
    }

    Ok(())
}

unsafe fn check_physical_device_extensions(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<()> {
    let extensions = instance
        .enumerate_device_extension_properties(physical_device, None)?
        .iter()
        .map(|e| e.extension_name)
        .collect::<HashSet<_>>();
    if DEVICE_EXTENSIONS.iter().all(|e| extensions.contains(e)) {
        Ok(())
    } else {
        Err(anyhow!(SuitabilityError("required device extensions")))
    }
}

/// Creates the logical device and fetches the graphics and present queues.
pub unsafe fn create_logical_device(instance: &Instance, data: &mut AppData) -> Result<Device> {
    let indices = QueueFamilyIndices::get(instance, data, data.physical_device)?;

    let mut unique_indices = HashSet::new();
    unique_indices.insert(indices.graphics);
    unique_indices.insert(indices.present);

    let queue_priorities = &[1.0];
    let queue_infos = unique_indices
        .iter()
        .map(|i| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(*i)
                .queue_priorities(queue_priorities)
        })
        .collect::<Vec<_>>();

    let layers = if data.options.validation {
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        vec![]
    };

    let mut extensions = DEVICE_EXTENSIONS.iter().map(|e| e.as_ptr()).collect::<Vec<_>>();
    if cfg!(target_os = "macos") {
        extensions.push(vk::KHR_PORTABILITY_SUBSET_EXTENSION.name.as_ptr());
    }

    let features = vk::PhysicalDeviceFeatures::builder().sampler_anisotropy(true);
    let mut dynamic_rendering =
        vk::PhysicalDeviceDynamicRenderingFeatures::builder().dynamic_rendering(true);

    let info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_layer_names(&layers)
        .enabled_extension_names(&extensions)
        .enabled_features(&features)
        .push_next(&mut dynamic_rendering);

    let device = instance.create_device(data.physical_device, &info, None)?;

    data.graphics_queue = device.get_device_queue(indices.graphics, 0);
    data.present_queue = device.get_device_queue(indices.present, 0);

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_beats_integrated_beats_other() {
        let discrete = device_type_score(vk::PhysicalDeviceType::DISCRETE_GPU);
        let integrated = device_type_score(vk::PhysicalDeviceType::INTEGRATED_GPU);
        let cpu = device_type_score(vk::PhysicalDeviceType::CPU);
        let virtual_gpu = device_type_score(vk::PhysicalDeviceType::VIRTUAL_GPU);
        assert!(discrete > integrated);
        assert!(integrated > cpu);
        assert_eq!(cpu, virtual_gpu);
    }

    #[test]
    fn highest_score_wins() {
        let winner = select_best(vec![("integrated", 2), ("discrete", 3), ("cpu", 1)]);
        assert_eq!(winner, Some("discrete"));
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let winner = select_best(vec![("first", 3), ("second", 3), ("third", 2)]);
        assert_eq!(winner, Some("first"));
    }

    #[test]
    fn no_candidates_no_winner() {
        assert_eq!(select_best(Vec::<(u32, u8)>::new()), None);
    }
}
