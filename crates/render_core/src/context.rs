//! Vulkan context management
//!
//! Low-level Vulkan initialization: instance, physical device selection
//! and logical device creation for headless rendering. There is no
//! surface or swapchain; work is submitted to a single graphics+transfer
//! queue and results are read back through host-visible buffers.

use ash::extensions::ext::DebugUtils;
use ash::{vk, Device, Entry, Instance};
use std::ffi::{CStr, CString};
use thiserror::Error;

use crate::commands::CommandPool;
use crate::settings::RenderSettings;

/// Errors produced by the rendering primitives
#[derive(Error, Debug)]
pub enum RenderError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Context or resource initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No device memory type satisfies the requested usage and properties
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// Runtime GLSL to SPIR-V compilation failed
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),

    /// Filesystem error while reading shaders or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or writing a rendered image failed
    #[error("Image output failed: {0}")]
    ImageOutput(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Debug utilities extension, present when validation is enabled
    debug_utils: Option<DebugUtils>,
    /// Debug messenger handle, present when validation is enabled
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance, optionally with validation layers
    pub fn new(app_name: &str, enable_validation: bool) -> RenderResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| RenderError::InitializationFailed(format!("Failed to load Vulkan: {e}")))?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| RenderError::InitializationFailed("invalid application name".to_string()))?;
        let engine_name_cstr = CString::new("render_core").unwrap();
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let mut extensions: Vec<*const i8> = Vec::new();
        let layer_names = if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
            log::info!("Enabling VK_LAYER_KHRONOS_validation");
            vec![CString::new("VK_LAYER_KHRONOS_validation").unwrap()]
        } else {
            vec![]
        };

        let layer_names_ptrs: Vec<*const i8> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(RenderError::Api)?
        };

        let (debug_utils, debug_messenger) = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            let debug_messenger = Self::setup_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(debug_messenger))
        } else {
            (None, None)
        };

        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
        })
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> RenderResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(RenderError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(debug_messenger)) =
                (&self.debug_utils, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*debug_messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback routing validation messages into the log
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let callback_data = *callback_data;
    let message = CStr::from_ptr(callback_data.p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Physical device selection and capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features
    pub features: vk::PhysicalDeviceFeatures,
    /// Device memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Index of the graphics+transfer queue family
    pub queue_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select the first device exposing a graphics+transfer queue family
    pub fn select_suitable_device(instance: &Instance) -> RenderResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(RenderError::Api)?
        };

        for device in devices {
            if let Ok(device_info) = Self::evaluate_device(instance, device) {
                log::info!("Selected GPU: {}", device_info.device_name());
                return Ok(device_info);
            }
        }

        Err(RenderError::InitializationFailed(
            "No GPU with a graphics+transfer queue found".to_string(),
        ))
    }

    fn evaluate_device(instance: &Instance, device: vk::PhysicalDevice) -> RenderResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        // Headless rendering needs one family handling both draws and
        // staging copies; presentation support is irrelevant.
        let queue_family = queue_families
            .iter()
            .position(|family| {
                family
                    .queue_flags
                    .contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)
            })
            .ok_or_else(|| {
                RenderError::InitializationFailed(
                    "No graphics+transfer queue family found".to_string(),
                )
            })? as u32;

        Ok(Self {
            device,
            properties,
            features,
            memory_properties,
            queue_family,
        })
    }

    /// Human-readable device name from the driver
    pub fn device_name(&self) -> String {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_string_lossy()
                .into_owned()
        }
    }

    /// Whether the device can run geometry-shader pipelines
    pub fn supports_geometry_shader(&self) -> bool {
        self.features.geometry_shader == vk::TRUE
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Combined graphics+transfer queue
    pub queue: vk::Queue,
    /// Index of the queue family the queue belongs to
    pub queue_family: u32,
}

impl LogicalDevice {
    /// Create a logical device with a single graphics+transfer queue
    pub fn new(instance: &Instance, physical_device_info: &PhysicalDeviceInfo) -> RenderResult<Self> {
        let queue_priorities = [1.0];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical_device_info.queue_family)
            .queue_priorities(&queue_priorities)
            .build();
        let queue_infos = [queue_info];

        // Geometry shaders are optional hardware; enable the feature only
        // where the device reports it so pipeline creation can rely on it.
        let device_features = vk::PhysicalDeviceFeatures::builder()
            .geometry_shader(physical_device_info.supports_geometry_shader())
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical_device_info.device, &create_info, None)
                .map_err(RenderError::Api)?
        };

        let queue = unsafe { device.get_device_queue(physical_device_info.queue_family, 0) };

        Ok(Self {
            device,
            queue,
            queue_family: physical_device_info.queue_family,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            // Ensure device is idle before destruction
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Main rendering context owning all core Vulkan resources
///
/// Covers the first three steps every demo shares: create a context,
/// pick a device, allocate command resources.
pub struct RenderContext {
    // Field order is drop order: the pool must go before the device,
    // the device before the instance.
    command_pool: CommandPool,
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    instance: VulkanInstance,
}

impl RenderContext {
    /// Create a context: instance, device selection, logical device and
    /// a command pool on the graphics+transfer family
    pub fn new(app_name: &str, settings: &RenderSettings) -> RenderResult<Self> {
        let instance = VulkanInstance::new(app_name, settings.validation)?;

        let physical_device = PhysicalDeviceInfo::select_suitable_device(&instance.instance)?;

        let device = LogicalDevice::new(&instance.instance, &physical_device)?;

        let command_pool = CommandPool::new(device.device.clone(), device.queue_family)?;

        Ok(Self {
            command_pool,
            device,
            physical_device,
            instance,
        })
    }

    /// Get a clone of the device handle table
    pub fn device(&self) -> Device {
        self.device.device.clone()
    }

    /// Get the graphics+transfer queue
    pub fn queue(&self) -> vk::Queue {
        self.device.queue
    }

    /// Get the queue family index
    pub fn queue_family(&self) -> u32 {
        self.device.queue_family
    }

    /// Get the selected physical device info
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get the device memory heaps and types
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.physical_device.memory_properties
    }

    /// Get the command pool
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    /// Human-readable name of the selected GPU
    pub fn device_name(&self) -> String {
        self.physical_device.device_name()
    }

    /// Whether geometry-shader pipelines can be created on this device
    pub fn supports_geometry_shader(&self) -> bool {
        self.physical_device.supports_geometry_shader()
    }

    /// Block until all submitted work has finished
    pub fn wait_idle(&self) -> RenderResult<()> {
        unsafe {
            self.device
                .device
                .device_wait_idle()
                .map_err(RenderError::Api)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_failure() {
        let err = RenderError::NoSuitableMemoryType;
        assert_eq!(err.to_string(), "No suitable memory type found");

        let err = RenderError::InvalidOperation {
            reason: "command buffer already recording".to_string(),
        };
        assert!(err.to_string().contains("already recording"));

        let err = RenderError::ShaderCompilation("unexpected token".to_string());
        assert!(err.to_string().starts_with("Shader compilation failed"));
    }

    #[test]
    fn io_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.spv");
        let err = RenderError::from(io);
        assert!(matches!(err, RenderError::Io(_)));
        assert!(err.to_string().contains("missing.spv"));
    }
}
