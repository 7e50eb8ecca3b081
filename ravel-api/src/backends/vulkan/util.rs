use crate::*;
use ash::vk;

pub(crate) fn format_to_vk(format: RavelFormat) -> vk::Format {
    match format {
        RavelFormat::UNDEFINED => vk::Format::UNDEFINED,
        RavelFormat::R8_UNORM => vk::Format::R8_UNORM,
        RavelFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        RavelFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        RavelFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        RavelFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        RavelFormat::R16_SFLOAT => vk::Format::R16_SFLOAT,
        RavelFormat::R16G16_SFLOAT => vk::Format::R16G16_SFLOAT,
        RavelFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        RavelFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        RavelFormat::R32_UINT => vk::Format::R32_UINT,
        RavelFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        RavelFormat::B10G11R11_UFLOAT_PACK32 => vk::Format::B10G11R11_UFLOAT_PACK32,
        RavelFormat::D16_UNORM => vk::Format::D16_UNORM,
        RavelFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        RavelFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        RavelFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

pub(crate) fn image_layout_to_vk(layout: RavelImageLayout) -> vk::ImageLayout {
    match layout {
        RavelImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        RavelImageLayout::General => vk::ImageLayout::GENERAL,
        RavelImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        RavelImageLayout::DepthStencilAttachment => {
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        }
        RavelImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        RavelImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        RavelImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        RavelImageLayout::Present => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn access_flags_to_vk(access: RavelAccessFlags) -> vk::AccessFlags2 {
    let mut flags = vk::AccessFlags2::NONE;
    if access.contains(RavelAccessFlags::SHADER_READ) {
        flags |= vk::AccessFlags2::SHADER_READ;
    }
    if access.contains(RavelAccessFlags::SHADER_WRITE) {
        flags |= vk::AccessFlags2::SHADER_WRITE;
    }
    if access.contains(RavelAccessFlags::UNIFORM_READ) {
        flags |= vk::AccessFlags2::UNIFORM_READ;
    }
    if access.contains(RavelAccessFlags::COLOR_ATTACHMENT_READ) {
        flags |= vk::AccessFlags2::COLOR_ATTACHMENT_READ;
    }
    if access.contains(RavelAccessFlags::COLOR_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags2::COLOR_ATTACHMENT_WRITE;
    }
    if access.contains(RavelAccessFlags::DEPTH_STENCIL_ATTACHMENT_READ) {
        flags |= vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ;
    }
    if access.contains(RavelAccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }
    if access.contains(RavelAccessFlags::TRANSFER_READ) {
        flags |= vk::AccessFlags2::TRANSFER_READ;
    }
    if access.contains(RavelAccessFlags::TRANSFER_WRITE) {
        flags |= vk::AccessFlags2::TRANSFER_WRITE;
    }
    if access.contains(RavelAccessFlags::HOST_WRITE) {
        flags |= vk::AccessFlags2::HOST_WRITE;
    }
    if access.contains(RavelAccessFlags::MEMORY_READ) {
        flags |= vk::AccessFlags2::MEMORY_READ;
    }
    if access.contains(RavelAccessFlags::MEMORY_WRITE) {
        flags |= vk::AccessFlags2::MEMORY_WRITE;
    }
    flags
}

pub(crate) fn texture_usage_to_vk(usage: RavelTextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(RavelTextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(RavelTextureUsage::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(RavelTextureUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(RavelTextureUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(RavelTextureUsage::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(RavelTextureUsage::TRANSFER_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn buffer_usage_to_vk(usage: RavelBufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    if usage.contains(RavelBufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(RavelBufferUsage::STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(RavelBufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(RavelBufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(RavelBufferUsage::TRANSFER_SRC) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(RavelBufferUsage::TRANSFER_DST) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn descriptor_type_to_vk(descriptor_type: RavelDescriptorType) -> vk::DescriptorType {
    match descriptor_type {
        RavelDescriptorType::Sampler => vk::DescriptorType::SAMPLER,
        RavelDescriptorType::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        RavelDescriptorType::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        RavelDescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        RavelDescriptorType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
    }
}

pub(crate) fn load_op_to_vk(load_op: RavelLoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        RavelLoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
        RavelLoadOp::Load => vk::AttachmentLoadOp::LOAD,
        RavelLoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
    }
}

pub(crate) fn filter_to_vk(filter: RavelFilterType) -> vk::Filter {
    match filter {
        RavelFilterType::Nearest => vk::Filter::NEAREST,
        RavelFilterType::Linear => vk::Filter::LINEAR,
    }
}

pub(crate) fn mip_filter_to_vk(filter: RavelFilterType) -> vk::SamplerMipmapMode {
    match filter {
        RavelFilterType::Nearest => vk::SamplerMipmapMode::NEAREST,
        RavelFilterType::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

pub(crate) fn address_mode_to_vk(address_mode: RavelAddressMode) -> vk::SamplerAddressMode {
    match address_mode {
        RavelAddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        RavelAddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        RavelAddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
    }
}

pub(crate) fn primitive_topology_to_vk(topology: RavelPrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        RavelPrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        RavelPrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        RavelPrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        RavelPrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
    }
}

/// Aspect used for barriers (covers stencil too when present)
pub(crate) fn barrier_aspect_mask(format: RavelFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else if format.has_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Aspect used for views. Views of depth/stencil formats only see depth.
pub(crate) fn view_aspect_mask(format: RavelFormat) -> vk::ImageAspectFlags {
    if format.has_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}
