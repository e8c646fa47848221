use crate::utils::error::{ApiError, Result};

/// Capacity of a GPU instance type as ECS sees it (1 vCPU = 1024 CPU units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSpec {
    pub name: &'static str,
    pub vcpus: u32,
    pub memory_mb: u32,
    pub gpus: u32,
}

const CATALOG: &[InstanceSpec] = &[
    InstanceSpec { name: "g4dn.xlarge", vcpus: 4, memory_mb: 16384, gpus: 1 },
    InstanceSpec { name: "g4dn.2xlarge", vcpus: 8, memory_mb: 32768, gpus: 1 },
    InstanceSpec { name: "g4dn.4xlarge", vcpus: 16, memory_mb: 65536, gpus: 1 },
    InstanceSpec { name: "g4dn.12xlarge", vcpus: 48, memory_mb: 196608, gpus: 4 },
    InstanceSpec { name: "g5.xlarge", vcpus: 4, memory_mb: 16384, gpus: 1 },
    InstanceSpec { name: "g5.2xlarge", vcpus: 8, memory_mb: 32768, gpus: 1 },
    InstanceSpec { name: "g5.12xlarge", vcpus: 48, memory_mb: 196608, gpus: 4 },
    InstanceSpec { name: "p3.2xlarge", vcpus: 8, memory_mb: 62464, gpus: 1 },
    InstanceSpec { name: "p3.8xlarge", vcpus: 32, memory_mb: 249856, gpus: 4 },
];

impl InstanceSpec {
    pub fn lookup(instance_type: &str) -> Option<&'static InstanceSpec> {
        CATALOG.iter().find(|spec| spec.name == instance_type)
    }

    pub fn cpu_units(&self) -> u32 {
        self.vcpus * 1024
    }

    /// 檢查單一 task 是否放得進一台 instance
    pub fn ensure_fits(&self, cpu: u32, memory_mb: u32, gpus: u32) -> Result<()> {
        let too_big = |field: &str, requested: u32, available: u32| ApiError::InvalidConfigValueError {
            field: field.to_string(),
            value: requested.to_string(),
            reason: format!("{} provides only {}", self.name, available),
        };

        if cpu > self.cpu_units() {
            return Err(too_big("service.cpu", cpu, self.cpu_units()));
        }
        if memory_mb > self.memory_mb {
            return Err(too_big("service.memory_mb", memory_mb, self.memory_mb));
        }
        if gpus > self.gpus {
            return Err(too_big("service.gpus", gpus, self.gpus));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_task_fits_g4dn_xlarge() {
        let spec = InstanceSpec::lookup("g4dn.xlarge").unwrap();
        assert_eq!(spec.cpu_units(), 4096);
        assert!(spec.ensure_fits(2048, 8192, 1).is_ok());
    }

    #[test]
    fn test_gpu_request_over_capacity() {
        let spec = InstanceSpec::lookup("g5.xlarge").unwrap();
        let err = spec.ensure_fits(2048, 8192, 2).unwrap_err();
        assert!(err.to_string().contains("service.gpus"));
    }

    #[test]
    fn test_unknown_type() {
        assert!(InstanceSpec::lookup("t3.micro").is_none());
    }
}
