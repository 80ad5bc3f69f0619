#![allow(dead_code, clippy::too_many_arguments)]

pub mod app;
pub mod appdata;
pub mod callback;
pub mod command;
pub mod config;
pub mod device;
pub mod model;
pub mod pipeline;
pub mod resource;
pub mod swapchain;

use anyhow::Result;
use vulkanalia::prelude::v1_0::*;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::app::App;
use crate::config::{Options, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};

#[rustfmt::skip]
fn main() -> Result<()> {
    pretty_env_logger::init();

    let options = Options::parse(std::env::args().skip(1));

    // Window

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .with_resizable(false)
        .build(&event_loop)?;

    // App

    let mut app = unsafe { App::create(&window, options)? };
    let mut destroying = false;
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            // Render a frame if our Vulkan app is not being destroyed.
            Event::MainEventsCleared if !destroying => unsafe { app.render() }.unwrap(),
            // Destroy our Vulkan app once the window closes or a quit key is hit.
            Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                destroying = true;
                *control_flow = ControlFlow::Exit;
                unsafe { app.device().device_wait_idle().unwrap(); }
                unsafe { app.destroy(); }
            }
            Event::WindowEvent { event: WindowEvent::KeyboardInput { input, .. }, .. }
                if !destroying && is_quit_key(&input) =>
            {
                destroying = true;
                *control_flow = ControlFlow::Exit;
                unsafe { app.device().device_wait_idle().unwrap(); }
                unsafe { app.destroy(); }
            }
            _ => {}
        }
    });
}

fn is_quit_key(input: &KeyboardInput) -> bool {
    input.state == ElementState::Pressed
        && matches!(
            input.virtual_keycode,
            Some(VirtualKeyCode::Escape) | Some(VirtualKeyCode::Q)
        )
}
