//! IDE run profiles and development launch arguments
//!
//! The four profiles are fixed: client and server, each unobfuscated and
//! obfuscated, in that display order. They are rendered as IntelliJ Gradle
//! run configurations (one XML file each) or as a single JSON document.

use crate::filesystem::MemoryFS;
use crate::flags::FeatureSet;
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Directory, relative to the project, IntelliJ reads shared run
/// configurations from.
pub const RUN_CONFIGURATIONS_DIR: &str = ".idea/runConfigurations";

/// A named launch of exactly one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunProfile {
    pub name: &'static str,
    pub task: &'static str,
}

const PROFILES: [RunProfile; 4] = [
    RunProfile {
        name: "1. Run Client",
        task: "runClient",
    },
    RunProfile {
        name: "2. Run Server",
        task: "runServer",
    },
    RunProfile {
        name: "3. Run Obfuscated Client",
        task: "runObfClient",
    },
    RunProfile {
        name: "4. Run Obfuscated Server",
        task: "runObfServer",
    },
];

/// The run profiles, in display order.
pub fn profiles() -> &'static [RunProfile] {
    &PROFILES
}

impl RunProfile {
    /// File name IntelliJ uses for this configuration: every character
    /// other than ASCII letters and digits becomes `_`.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}.xml", stem)
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<component name="ProjectRunConfigurationManager">
  <configuration default="false" name="{name}" type="GradleRunConfiguration" factoryName="Gradle">
    <ExternalSystemSettings>
      <option name="executionName" />
      <option name="externalProjectPath" value="$PROJECT_DIR$" />
      <option name="externalSystemIdString" value="GRADLE" />
      <option name="scriptParameters" value="" />
      <option name="taskDescriptions">
        <list />
      </option>
      <option name="taskNames">
        <list>
          <option value="{task}" />
        </list>
      </option>
      <option name="vmOptions" />
    </ExternalSystemSettings>
    <ExternalSystemDebugServerProcess>false</ExternalSystemDebugServerProcess>
    <ExternalSystemReattachDebugProcess>true</ExternalSystemReattachDebugProcess>
    <DebugAllEnabled>false</DebugAllEnabled>
    <RunAsTest>false</RunAsTest>
    <method v="2" />
  </configuration>
</component>
"#,
            name = escape_xml(self.name),
            task = escape_xml(self.task),
        )
    }
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// All profiles as a tree of XML files, keyed by file name.
pub fn xml_tree() -> Result<MemoryFS> {
    let mut tree = MemoryFS::new();
    for profile in profiles() {
        tree.add_file_string(PathBuf::from(profile.file_name()), &profile.to_xml())?;
    }
    Ok(tree)
}

/// All profiles as a JSON array.
pub fn to_json() -> Result<String> {
    Ok(serde_json::to_string_pretty(profiles())?)
}

/// JVM arguments for development launches.
pub fn jvm_args(features: &FeatureSet) -> Vec<String> {
    let mut args = vec![format!("-ea:{}", features.maven_group)];
    if let Some(coremod) = &features.coremod {
        args.push(format!("-Dfml.coreMods.load={}", coremod.plugin_class));
    }
    if features.mixins {
        args.push("-Dmixin.hotSwap=true".to_string());
        args.push("-Dmixin.checks.interfaces=true".to_string());
        args.push("-Dmixin.debug.export=true".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::fixtures::{base_flags, features};

    #[test]
    fn test_four_profiles_in_order() {
        let tasks: Vec<&str> = profiles().iter().map(|p| p.task).collect();
        assert_eq!(
            tasks,
            vec!["runClient", "runServer", "runObfClient", "runObfServer"]
        );
        assert_eq!(profiles()[2].name, "3. Run Obfuscated Client");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(profiles()[0].file_name(), "1__Run_Client.xml");
        assert_eq!(profiles()[3].file_name(), "4__Run_Obfuscated_Server.xml");
    }

    #[test]
    fn test_xml_names_one_task() {
        let xml = profiles()[1].to_xml();
        assert!(xml.contains(r#"name="2. Run Server""#));
        assert_eq!(xml.matches("<option value=").count(), 1);
        assert!(xml.contains(r#"<option value="runServer" />"#));
    }

    #[test]
    fn test_xml_tree() {
        let tree = xml_tree().unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree.exists("3__Run_Obfuscated_Client.xml"));
    }

    #[test]
    fn test_json() {
        let value: serde_json::Value = serde_json::from_str(&to_json().unwrap()).unwrap();
        assert_eq!(value[0]["name"], "1. Run Client");
        assert_eq!(value[3]["task"], "runObfServer");
    }

    #[test]
    fn test_jvm_args_plain() {
        assert_eq!(jvm_args(&features(&base_flags())), vec!["-ea:org.example.mymod"]);
    }

    #[test]
    fn test_jvm_args_coremod_and_mixins() {
        let flags = base_flags()
            .with("use_coremod", "true")
            .with("include_mod", "false")
            .with("coremod_plugin_class_name", "org.example.mymod.core.Plugin")
            .with("use_mixins", "true");
        assert_eq!(
            jvm_args(&features(&flags)),
            vec![
                "-ea:org.example.mymod",
                "-Dfml.coreMods.load=org.example.mymod.core.Plugin",
                "-Dmixin.hotSwap=true",
                "-Dmixin.checks.interfaces=true",
                "-Dmixin.debug.export=true",
            ]
        );
    }
}
