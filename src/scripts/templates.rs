//! Block templates for data retrieval and tool scripts.
//!
//! Every block that needs a destination starts with `dest_dir=...` and works
//! relative to `$dest_dir`, ending with a `cd` into it so that a following
//! post-script runs inside the retrieved data.

use tera::Context as TeraContext;

use super::render_template;
use crate::core::Result;

pub const GIT_CLONE: &str = "\
dest_dir={{ dest }}
rm -rf $dest_dir
giturl={{ url }}
gitbranch={{ branch }}
git clone $giturl --branch $gitbranch --single-branch --depth 1 $dest_dir
cd $dest_dir
";

pub const RSYNC: &str = "\
dest_dir={{ dest }}
rsync {{ options }} {{ targets | join(sep=\" \") }} $dest_dir/
cd $dest_dir
";

pub const COPY: &str = "\
dest_dir={{ dest }}
rm -rf $dest_dir
mkdir -p $dest_dir
{{ command }} {{ targets | join(sep=\" \") }} $dest_dir/
cd $dest_dir
";

pub const LINK: &str = "\
dest_dir={{ dest }}
rm -rf $dest_dir
ln -sfn {{ source }} $dest_dir
if [[ -L $dest_dir && -d $(readlink $dest_dir) ]]; then
    echo Link and directory exist
else
    echo Link or directory does not exist
    exit 1
fi
cd $dest_dir
";

pub const WEB: &str = "\
dest_dir={{ dest }}
mkdir -p $dest_dir
cd $dest_dir
wget -O {{ target }} {{ url }}
";

pub const MODULE_USE: &str = "module use {{ modulefiles }}";

pub const MODULE_LOAD: &str = "\
set +ux
module unload {{ module }} || true
module load {{ module }}/{{ version }}
set -ux
";

pub const CONDA_ACTIVATE: &str = "\
set +ux
{{ activate_cmd }} activate {{ environment }}
set -ux
";

pub const CONDA_FROM_FILE: &str = "\
rm -rf {{ env_dir }}
{{ conda_cmd }} env create --file {{ env_file }} -p {{ env_dir }}
";

pub const CONDA_FROM_PACKAGES: &str = "\
rm -rf {{ env_dir }}
{{ conda_cmd }} create -p {{ env_dir }} {{ packages | join(sep=\" \") }}
";

/// Shallow single-branch clone into `dest`.
pub fn git_clone(dest: &str, url: &str, branch: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("dest", dest);
    context.insert("url", url);
    context.insert("branch", branch);
    render_template("git", GIT_CLONE, &context)
}

/// Non-destructive sync of `targets` into `dest`.
pub fn rsync(dest: &str, targets: &[String], options: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("dest", dest);
    context.insert("targets", targets);
    context.insert("options", options);
    render_template("rsync", RSYNC, &context)
}

/// Clean copy of `targets` into `dest` with `command` (`scp`, `ecp`).
pub fn copy(command: &str, dest: &str, targets: &[String]) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("command", command);
    context.insert("dest", dest);
    context.insert("targets", targets);
    render_template(command, COPY, &context)
}

/// Symbolic link from `dest` to `source`, failing if it is not a directory.
pub fn link(dest: &str, source: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("dest", dest);
    context.insert("source", source);
    render_template("link", LINK, &context)
}

/// Download `url` into `dest/target`.
pub fn web(dest: &str, url: &str, target: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("dest", dest);
    context.insert("url", url);
    context.insert("target", target);
    render_template("web", WEB, &context)
}

/// Checksum post-condition for a downloaded file.
pub fn md5_check(md5: &str, target: &str) -> String {
    format!("test \"{md5}\" == \"$(md5sum {target} | awk '{{print $1}}')\"")
}

/// Load a module at a version, optionally from a private module path.
pub fn module_load(module: &str, version: &str, modulefiles: Option<&str>) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("module", module);
    context.insert("version", version);
    let load = render_template("module_load", MODULE_LOAD, &context)?;
    match modulefiles {
        Some(modulefiles) => {
            context.insert("modulefiles", modulefiles);
            let module_use = render_template("module_use", MODULE_USE, &context)?;
            Ok(format!("{module_use}\n{load}"))
        }
        None => Ok(load),
    }
}

pub fn module_unload(module: &str) -> String {
    format!("module unload {module}")
}

/// Prepend `value` to a colon-separated variable.
pub fn env_path_load(variable: &str, value: &str) -> String {
    format!("export {variable}={value}:${{{variable}:-}}")
}

/// Remove `value` from a colon-separated variable.
pub fn env_path_unload(variable: &str, value: &str) -> String {
    [
        format!("echo 'removing {value} from ${variable}'"),
        format!("export {variable}=${{{variable}/{value}:/}}"),
        format!("echo '${variable} after removing' && echo ${variable}"),
    ]
    .join("\n")
}

pub fn env_var_load(variable: &str, value: &str) -> String {
    format!("export {variable}={value}")
}

pub fn env_var_unload(variable: &str) -> String {
    format!("unset {variable}")
}

pub fn conda_activate(activate_cmd: &str, environment: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("activate_cmd", activate_cmd);
    context.insert("environment", environment);
    render_template("conda_activate", CONDA_ACTIVATE, &context)
}

pub fn conda_deactivate(activate_cmd: &str) -> String {
    format!("{activate_cmd} deactivate")
}

/// Recreate a conda environment from an environment file.
pub fn conda_from_file(conda_cmd: &str, env_file: &str, env_dir: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("conda_cmd", conda_cmd);
    context.insert("env_file", env_file);
    context.insert("env_dir", env_dir);
    render_template("conda_env_file", CONDA_FROM_FILE, &context)
}

/// Recreate a conda environment from a package list.
pub fn conda_from_packages(conda_cmd: &str, env_dir: &str, packages: &[String]) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("conda_cmd", conda_cmd);
    context.insert("env_dir", env_dir);
    context.insert("packages", packages);
    render_template("conda_create", CONDA_FROM_PACKAGES, &context)
}
