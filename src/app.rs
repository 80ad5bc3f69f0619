use std::collections::HashSet;
use std::ptr::copy_nonoverlapping as memcpy;
use std::time::Instant;

use anyhow::{anyhow, Result};
use log::*;
use nalgebra_glm as glm;
use vulkanalia::loader::{LibloadingLoader, LIBRARY};
use vulkanalia::prelude::v1_2::*;
use vulkanalia::vk::{ExtDebugUtilsExtension, Handle, KhrSurfaceExtension, KhrSwapchainExtension};
use vulkanalia::window as vk_window;
use winit::window::Window;

use crate::appdata::AppData;
use crate::callback::debug_callback;
use crate::command::{create_command_buffers, create_command_pool, record_draw_commands};
use crate::config::{Options, MAX_FRAMES_IN_FLIGHT, VALIDATION_LAYER};
use crate::device::{create_logical_device, pick_physical_device};
use crate::model::UniformBufferObject;
use crate::pipeline::{create_descriptor_set_layout, create_pipeline, get_depth_format};
use crate::resource::{
    create_depth_objects, create_descriptor_pool, create_descriptor_set, create_index_buffer,
    create_texture_image, create_texture_image_view, create_texture_sampler,
    create_uniform_buffer, create_vertex_buffer,
};
use crate::swapchain::{create_swapchain, create_swapchain_image_views};

/// Our Vulkan app.
#[derive(Clone, Debug)]
pub struct App {
    entry: Entry,
    instance: Instance,
    data: AppData,
    device: Device,
    frame: usize,
    start: Instant,
    uniform_map: *mut UniformBufferObject,
    frame_count: u32,
    fps_timer: Instant,
}

impl App {
    /// Creates our Vulkan app: selects a device, builds the presentation
    /// pipeline and uploads all device-resident resources.
    pub unsafe fn create(window: &Window, options: Options) -> Result<Self> {
        let loader = LibloadingLoader::new(LIBRARY)?;
        let entry = Entry::new(loader).map_err(|b| anyhow!("{}", b))?;
        let mut data = AppData { options, ..Default::default() };
        let instance = create_instance(window, &entry, &mut data)?;
        data.surface = vk_window::create_surface(&instance, window)?;
        pick_physical_device(&instance, &mut data)?;
        let device = create_logical_device(&instance, &mut data)?;
        create_swapchain(window, &instance, &device, &mut data)?;
        create_swapchain_image_views(&device, &mut data)?;
        data.depth_format = get_depth_format(&instance, &data)?;
        create_descriptor_set_layout(&device, &mut data)?;
        create_pipeline(&device, &mut data)?;
        create_command_pool(&instance, &device, &mut data)?;
        create_command_buffers(&device, &mut data)?;
        create_depth_objects(&instance, &device, &mut data)?;
        create_texture_image(&instance, &device, &mut data)?;
        create_texture_image_view(&device, &mut data)?;
        create_texture_sampler(&instance, &device, &mut data)?;
        create_vertex_buffer(&instance, &device, &mut data)?;
        create_index_buffer(&instance, &device, &mut data)?;
        let uniform_map = create_uniform_buffer(&instance, &device, &mut data)?;
        create_descriptor_pool(&device, &mut data)?;
        create_descriptor_set(&device, &mut data)?;
        create_sync_objects(&device, &mut data)?;
        Ok(Self {
            entry,
            instance,
            data,
            device,
            frame: 0,
            start: Instant::now(),
            uniform_map,
            frame_count: 0,
            fps_timer: Instant::now(),
        })
    }

    /// Renders one frame: wait for the slot's fence, acquire an image,
    /// re-record the slot's command buffer, submit and present.
    pub unsafe fn render(&mut self) -> Result<()> {
        let in_flight_fence = self.data.in_flight_fences[self.frame];

        // The fence guards every per-slot resource: the command buffer may
        // not be reset and the uniform buffer may not be rewritten while the
        // previous submission for this slot is still in flight.
        self.device.wait_for_fences(&[in_flight_fence], true, u64::MAX)?;
        self.device.reset_fences(&[in_flight_fence])?;

        let image_index = self
            .device
            .acquire_next_image_khr(
                self.data.swapchain,
                u64::MAX,
                self.data.image_available_semaphores[self.frame],
                vk::Fence::null(),
            )?
            .0 as usize;

        self.update_uniform_buffer();

        let command_buffer = self.data.command_buffers[self.frame];
        self.device
            .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())?;
        record_draw_commands(&self.device, &self.data, command_buffer, image_index)?;

        let wait_semaphores = &[self.data.image_available_semaphores[self.frame]];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[command_buffer];
        let signal_semaphores = &[self.data.render_finished_semaphores[self.frame]];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        self.device
            .queue_submit(self.data.graphics_queue, &[submit_info], in_flight_fence)?;

        let swapchains = &[self.data.swapchain];
        let image_indices = &[image_index as u32];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(signal_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        self.device.queue_present_khr(self.data.present_queue, &present_info)?;

        self.frame = (self.frame + 1) % MAX_FRAMES_IN_FLIGHT;

        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs() >= 1 {
            info!("FPS: {}", self.frame_count);
            self.fps_timer = Instant::now();
            self.frame_count = 0;
        }

        Ok(())
    }

    /// Rewrites the persistently mapped uniform buffer in place. Safe because
    /// the fence wait guarantees the previous GPU read has completed, and the
    /// memory is host-coherent.
    unsafe fn update_uniform_buffer(&mut self) {
        let time = self.start.elapsed().as_secs_f32();

        let model = glm::rotate(
            &glm::identity(),
            time * glm::radians(&glm::vec1(90.0))[0],
            &glm::vec3(0.0, 0.0, 1.0),
        );
        let view = glm::look_at(
            &glm::vec3(2.0, 2.0, 2.0),
            &glm::vec3(0.0, 0.0, 0.0),
            &glm::vec3(0.0, 0.0, 1.0),
        );
        let mut proj = glm::perspective_rh_zo(
            self.data.swapchain_extent.width as f32 / self.data.swapchain_extent.height as f32,
            glm::radians(&glm::vec1(45.0))[0],
            0.1,
            10.0,
        );
        proj[(1, 1)] *= -1.0;

        let ubo = UniformBufferObject { model, view, proj };
        memcpy(&ubo, self.uniform_map, 1);
    }

    /// Destroys our Vulkan app, releasing resources in reverse creation order.
    /// The caller must wait for the device to go idle first.
    #[rustfmt::skip]
    pub unsafe fn destroy(&mut self) {
        self.data.in_flight_fences.iter().for_each(|f| self.device.destroy_fence(*f, None));
        self.data.render_finished_semaphores.iter().for_each(|s| self.device.destroy_semaphore(*s, None));
        self.data.image_available_semaphores.iter().for_each(|s| self.device.destroy_semaphore(*s, None));
        self.device.destroy_descriptor_pool(self.data.descriptor_pool, None);
        self.device.unmap_memory(self.data.uniform_buffer_memory);
        self.device.destroy_buffer(self.data.uniform_buffer, None);
        self.device.free_memory(self.data.uniform_buffer_memory, None);
        self.device.destroy_buffer(self.data.index_buffer, None);
        self.device.free_memory(self.data.index_buffer_memory, None);
        self.device.destroy_buffer(self.data.vertex_buffer, None);
        self.device.free_memory(self.data.vertex_buffer_memory, None);
        self.device.destroy_sampler(self.data.texture_sampler, None);
        self.device.destroy_image_view(self.data.texture_image_view, None);
        self.device.destroy_image(self.data.texture_image, None);
        self.device.free_memory(self.data.texture_image_memory, None);
        self.device.destroy_image_view(self.data.depth_image_view, None);
        self.device.destroy_image(self.data.depth_image, None);
        self.device.free_memory(self.data.depth_image_memory, None);
        self.device.destroy_command_pool(self.data.command_pool, None);
        self.device.destroy_pipeline(self.data.pipeline, None);
        self.device.destroy_pipeline_layout(self.data.pipeline_layout, None);
        self.device.destroy_descriptor_set_layout(self.data.descriptor_set_layout, None);
        self.data.swapchain_image_views.iter().for_each(|v| self.device.destroy_image_view(*v, None));
        self.device.destroy_swapchain_khr(self.data.swapchain, None);
        self.device.destroy_device(None);
        if !self.data.messenger.is_null() {
            self.instance.destroy_debug_utils_messenger_ext(self.data.messenger, None);
        }
        self.instance.destroy_surface_khr(self.data.surface, None);
        self.instance.destroy_instance(None);
    }

    /// accessors
    pub fn device(&self) -> &Device {
        &self.device
    }
}

unsafe fn create_instance(window: &Window, entry: &Entry, data: &mut AppData) -> Result<Instance> {
    let application_info = vk::ApplicationInfo::builder()
        .application_name(b"vkdemo\0")
        .application_version(vk::make_version(0, 1, 0))
        .engine_name(b"No Engine\0")
        .engine_version(vk::make_version(0, 0, 0))
        .api_version(vk::make_version(1, 3, 0));

    // Layers. A requested-but-missing validation layer is the one soft
    // failure: warn and continue without it.
    let available_layers = entry
        .enumerate_instance_layer_properties()?
        .iter()
        .map(|l| l.layer_name)
        .collect::<HashSet<_>>();

    let validation = data.options.validation && {
        if available_layers.contains(&VALIDATION_LAYER) {
            true
        } else {
            warn!("Validation layer requested but not supported.");
            false
        }
    };

    let layers = if validation {
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        Vec::new()
    };

    // Extensions
    let mut extensions = vk_window::get_required_instance_extensions(window)
        .iter()
        .map(|e| e.as_ptr())
        .collect::<Vec<_>>();

    let flags = if cfg!(target_os = "macos") {
        extensions
            .push(vk::ExtensionName::from_bytes(b"VK_KHR_get_physical_device_properties2").as_ptr());
        extensions.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name.as_ptr());
        vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
    } else {
        vk::InstanceCreateFlags::empty()
    };

    if validation {
        extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION.name.as_ptr());
    }

    // Create
    let mut info = vk::InstanceCreateInfo::builder()
        .flags(flags)
        .application_info(&application_info)
        .enabled_layer_names(&layers)
        .enabled_extension_names(&extensions);

    let mut debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::all())
        .message_type(vk::DebugUtilsMessageTypeFlagsEXT::all())
        .user_callback(Some(debug_callback));

    if validation {
        info = info.push_next(&mut debug_info);
    }

    let instance = entry.create_instance(&info, None)?;

    // Messenger
    if validation {
        data.messenger = instance.create_debug_utils_messenger_ext(&debug_info, None)?;
    }

    Ok(instance)
}

/// Creates the per-slot sync objects: an image-available semaphore, a
/// render-finished semaphore and a completion fence created signaled so the
/// first wait on each slot passes.
unsafe fn create_sync_objects(device: &Device, data: &mut AppData) -> Result<()> {
    let semaphore_info = vk::SemaphoreCreateInfo::builder();
    let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);

    for _ in 0..MAX_FRAMES_IN_FLIGHT {
        data.image_available_semaphores
            .push(device.create_semaphore(&semaphore_info, None)?);
        data.render_finished_semaphores
            .push(device.create_semaphore(&semaphore_info, None)?);
        data.in_flight_fences.push(device.create_fence(&fence_info, None)?);
    }

    Ok(())
}
