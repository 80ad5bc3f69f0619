use anyhow::Result;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::KhrSwapchainExtension;
use winit::window::Window;

use crate::appdata::AppData;
use crate::config::PREFERRED_IMAGE_COUNT;
use crate::device::{QueueFamilyIndices, SwapchainSupport};

/// Creates the swapchain and caches its format, extent and images.
pub unsafe fn create_swapchain(
    window: &Window,
    instance: &Instance,
    device: &Device,
    data: &mut AppData,
) -> Result<()> {
    let indices = QueueFamilyIndices::get(instance, data, data.physical_device)?;
    let support = SwapchainSupport::get(instance, data, data.physical_device)?;

    let surface_format = get_swapchain_surface_format(&support.formats);
    let present_mode = get_swapchain_present_mode(&support.present_modes, data.options.present_mode);
    let size = window.inner_size();
    let extent = get_swapchain_extent(&support.capabilities, size.width, size.height);
    let image_count = get_swapchain_image_count(&support.capabilities, PREFERRED_IMAGE_COUNT);

    let mut queue_family_indices = vec![];
    let image_sharing_mode = if indices.graphics != indices.present {
        queue_family_indices.push(indices.graphics);
        queue_family_indices.push(indices.present);
        vk::SharingMode::CONCURRENT
    } else {
        vk::SharingMode::EXCLUSIVE
    };

    let info = vk::SwapchainCreateInfoKHR::builder()
        .surface(data.surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(image_sharing_mode)
        .queue_family_indices(&queue_family_indices)
        .pre_transform(support.capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(vk::SwapchainKHR::null());

    data.swapchain = device.create_swapchain_khr(&info, None)?;
    data.swapchain_images = device.get_swapchain_images_khr(data.swapchain)?;
    data.swapchain_format = surface_format.format;
    data.swapchain_extent = extent;

    Ok(())
}

/// Prefers 8-bit BGRA sRGB with the sRGB-nonlinear color space, falling back
/// to the first supported format.
pub fn get_swapchain_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .cloned()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .unwrap_or_else(|| formats[0])
}

/// Uses the requested present mode when the surface supports it; FIFO is the
/// only mode guaranteed to exist.
pub fn get_swapchain_present_mode(
    present_modes: &[vk::PresentModeKHR],
    requested: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    if present_modes.contains(&requested) {
        requested
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Returns the surface's current extent, or the framebuffer size clamped into
/// the capability bounds when the surface reports the "match window" sentinel.
pub fn get_swapchain_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_width: u32,
    framebuffer_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D::builder()
        .width(framebuffer_width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ))
        .height(framebuffer_height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ))
        .build()
}

/// Clamps the requested image count into the capability bounds, treating a
/// zero maximum (unbounded) as one more than the minimum.
pub fn get_swapchain_image_count(capabilities: &vk::SurfaceCapabilitiesKHR, requested: u32) -> u32 {
    let max = if capabilities.max_image_count == 0 {
        capabilities.min_image_count + 1
    } else {
        capabilities.max_image_count
    };
    requested.clamp(capabilities.min_image_count, max)
}

/// Creates one full-color, identity-swizzled view per swapchain image.
pub unsafe fn create_swapchain_image_views(device: &Device, data: &mut AppData) -> Result<()> {
    data.swapchain_image_views = data
        .swapchain_images
        .iter()
        .map(|i| {
            let components = vk::ComponentMapping::builder()
                .r(vk::ComponentSwizzle::IDENTITY)
                .g(vk::ComponentSwizzle::IDENTITY)
                .b(vk::ComponentSwizzle::IDENTITY)
                .a(vk::ComponentSwizzle::IDENTITY);
            let subresource_range = vk::ImageSubresourceRange::builder()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1);
            let info = vk::ImageViewCreateInfo::builder()
                .image(*i)
                .view_type(vk::ImageViewType::_2D)
                .format(data.swapchain_format)
                .components(components)
                .subresource_range(subresource_range);
            device.create_image_view(&info, None)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(
        current: (u32, u32),
        min: (u32, u32),
        max: (u32, u32),
        min_images: u32,
        max_images: u32,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: current.0, height: current.1 },
            min_image_extent: vk::Extent2D { width: min.0, height: min.1 },
            max_image_extent: vk::Extent2D { width: max.0, height: max.1 },
            min_image_count: min_images,
            max_image_count: max_images,
            ..Default::default()
        }
    }

    #[test]
    fn prefers_bgra_srgb_nonlinear() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        let chosen = get_swapchain_surface_format(&formats);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::R16G16B16A16_SFLOAT,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        }];
        let chosen = get_swapchain_surface_format(&formats);
        assert_eq!(chosen.format, vk::Format::R16G16B16A16_SFLOAT);
    }

    #[test]
    fn current_extent_used_verbatim() {
        let capabilities = capabilities((640, 480), (1, 1), (4096, 4096), 1, 0);
        let extent = get_swapchain_extent(&capabilities, 1920, 1080);
        assert_eq!((extent.width, extent.height), (640, 480));
    }

    #[test]
    fn sentinel_extent_derived_from_framebuffer() {
        let capabilities = capabilities((u32::MAX, u32::MAX), (1, 1), (4096, 4096), 1, 0);
        let extent = get_swapchain_extent(&capabilities, 1920, 1080);
        assert_eq!((extent.width, extent.height), (1920, 1080));
    }

    #[test]
    fn sentinel_extent_clamped_to_bounds() {
        let capabilities = capabilities((u32::MAX, u32::MAX), (200, 200), (1024, 768), 1, 0);
        let extent = get_swapchain_extent(&capabilities, 1920, 100);
        assert_eq!((extent.width, extent.height), (1024, 200));
    }

    #[test]
    fn unbounded_image_count_treated_as_min_plus_one() {
        let capabilities = capabilities((0, 0), (0, 0), (0, 0), 1, 0);
        assert_eq!(get_swapchain_image_count(&capabilities, 2), 2);
    }

    #[test]
    fn image_count_clamped_to_capabilities() {
        let bounded = capabilities((0, 0), (0, 0), (0, 0), 3, 8);
        assert_eq!(get_swapchain_image_count(&bounded, 2), 3);
        let tight = capabilities((0, 0), (0, 0), (0, 0), 1, 1);
        assert_eq!(get_swapchain_image_count(&tight, 2), 1);
    }

    #[test]
    fn unsupported_present_mode_falls_back_to_fifo() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(
            get_swapchain_present_mode(&modes, vk::PresentModeKHR::MAILBOX),
            vk::PresentModeKHR::FIFO
        );
        assert_eq!(
            get_swapchain_present_mode(&modes, vk::PresentModeKHR::IMMEDIATE),
            vk::PresentModeKHR::IMMEDIATE
        );
    }
}
