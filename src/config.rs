use vulkanalia::prelude::v1_0::*;

pub const WINDOW_TITLE: &str = "vkdemo";
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;

/// The name of the validation layer requested unless `--disable-layers` is given.
pub const VALIDATION_LAYER: vk::ExtensionName =
    vk::ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

/// Device extensions every candidate physical device must support.
pub const DEVICE_EXTENSIONS: &[vk::ExtensionName] = &[vk::KHR_SWAPCHAIN_EXTENSION.name];

/// Number of in-flight frame slots. All per-slot state (command buffers and
/// sync objects) is indexed `frame % MAX_FRAMES_IN_FLIGHT`, so raising this
/// is a one-constant change.
pub const MAX_FRAMES_IN_FLIGHT: usize = 1;

/// Swapchain images requested before clamping to the surface capabilities.
pub const PREFERRED_IMAGE_COUNT: u32 = 2;

pub const VERTEX_SHADER_PATH: &str = "shaders/shader.vert.spv";
pub const FRAGMENT_SHADER_PATH: &str = "shaders/shader.frag.spv";
pub const TEXTURE_PATH: &str = "resources/texture.png";

/// Settings taken from the command line.
#[derive(Copy, Clone, Debug)]
pub struct Options {
    pub validation: bool,
    pub present_mode: vk::PresentModeKHR,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            validation: true,
            present_mode: vk::PresentModeKHR::FIFO,
        }
    }
}

impl Options {
    /// Parses command-line flags. Unrecognized flags are ignored.
    pub fn parse(args: impl Iterator<Item = String>) -> Self {
        let mut options = Self::default();
        for arg in args {
            match arg.as_str() {
                "--disable-layers" => options.validation = false,
                "--mailbox" => options.present_mode = vk::PresentModeKHR::MAILBOX,
                _ => {}
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Options::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn defaults_are_fifo_with_layers() {
        let options = parse(&[]);
        assert!(options.validation);
        assert_eq!(options.present_mode, vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn disable_layers() {
        let options = parse(&["--disable-layers"]);
        assert!(!options.validation);
    }

    #[test]
    fn mailbox() {
        let options = parse(&["--mailbox"]);
        assert_eq!(options.present_mode, vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn unrecognized_flags_are_ignored() {
        let options = parse(&["--frobnicate", "-x", "--mailbox", "extra"]);
        assert!(options.validation);
        assert_eq!(options.present_mode, vk::PresentModeKHR::MAILBOX);
    }
}
