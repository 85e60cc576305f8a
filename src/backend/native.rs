//! Binding to the native `libmprobe` C API
//!
//! Only compiled with the `native` feature. The library is linked dynamically
//! and reached through the handle functions declared in `mprobe.h`; this
//! module wraps those handles in owned types that implement the backend
//! traits.
//!
//! # Handle Lifetimes
//!
//! An analysis handle refers to its problem handle, so both
//! [`NativeProblem`] and every [`NativeAnalysis`] created from it share one
//! reference-counted [`RawProblem`]. The problem is unloaded only after the
//! last analysis handle has been released.
//!
//! # Errors
//!
//! After each problem query the library's last-error slot is checked; a
//! non-zero error type becomes [`WorkshopError::Library`].

use crate::config::AnalysisSettings;
use crate::error::{Result, WorkshopError};
use crate::histogram::{BinLayout, HistType, HistogramStats};
use crate::types::{
    Bounds, ConstraintType, EmpiricalShape, FunctionKind, FunctionShape, ObjectiveType,
    OptimumEffect, Outcome, Presence, RegionEffect, ResultStatus, VariableType,
};
use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use super::library_trait::{AnalysisBackend, ProblemBackend, ProblemLoader};

type MpHandle = *mut c_void;

#[link(name = "mprobe")]
extern "C" {
    fn mprobe_init();
    fn mprobe_deinit();
    fn mp_loadPlugins(path: *const c_char);

    fn mp_load(num_files: c_int, files: *const *const c_char) -> MpHandle;
    fn mp_unload(handle: MpHandle);
    fn mp_releaseName(handle: MpHandle, name: *const c_char);
    fn mp_instanceName(handle: MpHandle) -> *const c_char;

    fn mp_variables(handle: MpHandle) -> c_int;
    fn mp_variableName(handle: MpHandle, variable: c_int) -> *const c_char;
    fn mp_variableType(handle: MpHandle, variable: c_int) -> c_int;
    fn mp_variablePresence(
        handle: MpHandle,
        variable: c_int,
        constraints: *mut c_int,
        objectives: *mut c_int,
    );
    fn mp_variableBounds(handle: MpHandle, variable: c_int, lower: *mut f64, upper: *mut f64);

    fn mp_objectives(handle: MpHandle) -> c_int;
    fn mp_objectiveName(handle: MpHandle, objective: c_int) -> *const c_char;
    fn mp_objectiveType(handle: MpHandle, objective: c_int) -> c_int;
    fn mp_objectiveVariables(handle: MpHandle, objective: c_int, variables: *mut c_int) -> c_int;

    fn mp_constraints(handle: MpHandle) -> c_int;
    fn mp_constraintName(handle: MpHandle, constraint: c_int) -> *const c_char;
    fn mp_constraintType(handle: MpHandle, constraint: c_int) -> c_int;
    fn mp_constraintBounds(handle: MpHandle, constraint: c_int, lower: *mut f64, upper: *mut f64);
    fn mp_constraintVariables(handle: MpHandle, constraint: c_int, variables: *mut c_int) -> c_int;

    fn mp_functionType(handle: MpHandle, kind: c_int, function: c_int) -> c_int;

    fn mp_GetLastError(handle: MpHandle, message: *mut *const c_char) -> c_int;
    fn mp_ReleaseErrorStr(handle: MpHandle, message: *const c_char);

    fn mp_createAnalysis(problem: MpHandle) -> MpHandle;
    fn mp_releaseAnalysis(analysis: MpHandle);

    fn mp_aVariableBoundLineSample(analysis: MpHandle, kind: c_int, function: c_int, extra: c_int);
    fn mp_aBounds(analysis: MpHandle, variable: c_int, lower: *mut f64, upper: *mut f64);
    fn mp_aResetBounds(analysis: MpHandle);
    fn mp_aSetBounds(analysis: MpHandle, variable: c_int, lower: f64, upper: f64);

    fn mp_aLineLengthBounds(analysis: MpHandle, min: *mut f64, max: *mut f64);
    fn mp_aSetLineLengthBounds(analysis: MpHandle, min: f64, max: f64);
    fn mp_aSnapDiscreteComponents(analysis: MpHandle) -> c_int;
    fn mp_aSetSnapDiscreteComponents(analysis: MpHandle, snap: c_int);
    fn mp_aNumLineSegments(analysis: MpHandle) -> c_uint;
    fn mp_aSetNumLineSegments(analysis: MpHandle, segments: c_uint);
    fn mp_aInteriorLinePoints(analysis: MpHandle) -> c_uint;
    fn mp_aSetNumInteriorLinePoints(analysis: MpHandle, points: c_uint);
    fn mp_aMinimumPointsNeeded(analysis: MpHandle) -> c_uint;
    fn mp_aSetMinimumPointsNeeded(analysis: MpHandle, points: c_uint);
    fn mp_aEvalErrorTolerance(analysis: MpHandle) -> f64;
    fn mp_aSetEvalErrorTolerance(analysis: MpHandle, tol: f64) -> c_int;
    fn mp_aInfinity(analysis: MpHandle) -> f64;
    fn mp_aSetInfinity(analysis: MpHandle, inf: f64);
    fn mp_aEqualityTolerance(analysis: MpHandle) -> f64;
    fn mp_aSetEqualityTolerance(analysis: MpHandle, tol: f64) -> c_int;
    fn mp_aAlmostEqualTolerance(analysis: MpHandle) -> f64;
    fn mp_aSetAlmostEqualTolerance(analysis: MpHandle, tol: f64) -> c_int;

    fn mp_aEffectiveness(analysis: MpHandle, constraint: c_int, lower: *mut f64, upper: *mut f64) -> u8;
    fn mp_aExtremum(analysis: MpHandle, objective: c_int, value: *mut f64) -> u8;
    fn mp_aExtremumPoint(analysis: MpHandle, objective: c_int, point: *mut f64) -> u8;

    fn mp_aGetHistogramBin(analysis: MpHandle, hist: c_int, bin: c_int) -> u64;
    fn mp_aGetHistogramNumBins(analysis: MpHandle, hist: c_int) -> c_uint;
    fn mp_aGetHistogramNumAboveRange(analysis: MpHandle, hist: c_int) -> u64;
    fn mp_aGetHistogramNumBelowRange(analysis: MpHandle, hist: c_int) -> u64;
    fn mp_aGetHistogramDataPoints(analysis: MpHandle, hist: c_int) -> u64;
    fn mp_aGetHistogramMean(analysis: MpHandle, hist: c_int) -> f64;
    fn mp_aGetHistogramStdDev(analysis: MpHandle, hist: c_int) -> f64;
    fn mp_aGetHistogramVariance(analysis: MpHandle, hist: c_int) -> f64;
    fn mp_aGetHistogramPopVariance(analysis: MpHandle, hist: c_int) -> f64;
    fn mp_aGetHistogramMaximum(analysis: MpHandle, hist: c_int) -> f64;
    fn mp_aGetHistogramMinimum(analysis: MpHandle, hist: c_int) -> f64;
    fn mp_aSetHistogramBins(
        analysis: MpHandle,
        hist: c_int,
        bins: c_int,
        first_width: f64,
        upper_bounds: *mut f64,
    );

    fn mp_aGetEmpiricalShape(analysis: MpHandle, function: c_int, kind: c_int) -> u8;
    fn mp_aGetOptimumEffect(analysis: MpHandle, objective: c_int) -> u8;
    fn mp_aGetRegionEffect(analysis: MpHandle, constraint: c_int) -> u8;
}

fn to_c_index(index: usize) -> Result<c_int> {
    c_int::try_from(index).map_err(|_| WorkshopError::Library(format!("index {} too large", index)))
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| WorkshopError::Load(format!("Invalid path {}", path.display())))
}

/// Process-wide library initialisation and reader plugins
pub struct NativeLibrary {
    _private: (),
}

impl NativeLibrary {
    /// Initialise the library and load reader plugins from `plugin_dir`
    pub fn new(plugin_dir: Option<&Path>) -> Result<Self> {
        let dir = plugin_dir.map(path_to_cstring).transpose()?;
        // SAFETY: init has no preconditions; the plugin path outlives the call.
        unsafe {
            mprobe_init();
            if let Some(dir) = &dir {
                mp_loadPlugins(dir.as_ptr());
            }
        }
        tracing::info!("Native analysis library initialised");
        Ok(Self { _private: () })
    }
}

impl Drop for NativeLibrary {
    fn drop(&mut self) {
        // SAFETY: paired with mprobe_init in `new`.
        unsafe { mprobe_deinit() };
    }
}

impl ProblemLoader for NativeLibrary {
    fn open(&self, files: &[PathBuf]) -> Result<Box<dyn ProblemBackend>> {
        if files.is_empty() {
            return Err(WorkshopError::Load("No files given".to_string()));
        }
        let owned = files
            .iter()
            .map(|p| path_to_cstring(p))
            .collect::<Result<Vec<_>>>()?;
        let ptrs: Vec<*const c_char> = owned.iter().map(|c| c.as_ptr()).collect();
        let count = to_c_index(ptrs.len())?;

        // SAFETY: `ptrs` points into `owned`, both alive for the call.
        let handle = unsafe { mp_load(count, ptrs.as_ptr()) };
        if handle.is_null() {
            return Err(WorkshopError::Load(format!(
                "No reader plugin could open {}",
                files[0].display()
            )));
        }
        Ok(Box::new(NativeProblem {
            raw: Arc::new(RawProblem(handle)),
        }))
    }
}

/// Owned problem handle, unloaded on drop
pub struct RawProblem(MpHandle);

// SAFETY: the library serialises access to problem data internally and the
// handle is only read after loading.
unsafe impl Send for RawProblem {}
unsafe impl Sync for RawProblem {}

impl Drop for RawProblem {
    fn drop(&mut self) {
        // SAFETY: the handle came from mp_load and is released exactly once.
        unsafe { mp_unload(self.0) };
    }
}

impl RawProblem {
    fn check_error(&self) -> Result<()> {
        let mut message: *const c_char = ptr::null();
        // SAFETY: valid handle; the library allocates the message, released below.
        let code = unsafe { mp_GetLastError(self.0, &mut message) };
        if code == 0 {
            return Ok(());
        }
        let text = if message.is_null() {
            format!("error type {}", code)
        } else {
            // SAFETY: non-null message is a NUL-terminated string from the library.
            let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
            unsafe { mp_ReleaseErrorStr(self.0, message) };
            text
        };
        Err(WorkshopError::Library(text))
    }

    fn take_name(&self, name: *const c_char) -> Result<String> {
        if name.is_null() {
            self.check_error()?;
            return Ok(String::new());
        }
        // SAFETY: names are NUL-terminated and must be handed back with mp_releaseName.
        let text = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
        unsafe { mp_releaseName(self.0, name) };
        Ok(text)
    }

    fn count(&self, raw: c_int) -> Result<usize> {
        self.check_error()?;
        usize::try_from(raw).map_err(|_| WorkshopError::Library(format!("negative count {}", raw)))
    }

    fn index_list(&self, buffer: Vec<c_int>, len: c_int) -> Result<Vec<usize>> {
        self.check_error()?;
        let len = usize::try_from(len).unwrap_or(0).min(buffer.len());
        Ok(buffer[..len]
            .iter()
            .filter_map(|&i| usize::try_from(i).ok())
            .collect())
    }
}

/// Problem handle loaded by the native library
pub struct NativeProblem {
    raw: Arc<RawProblem>,
}

impl NativeProblem {
    fn h(&self) -> MpHandle {
        self.raw.0
    }

    fn bounds_via(
        &self,
        index: usize,
        f: unsafe extern "C" fn(MpHandle, c_int, *mut f64, *mut f64),
    ) -> Result<Bounds> {
        let (mut lower, mut upper) = (0.0, 0.0);
        // SAFETY: out-pointers reference live locals.
        unsafe { f(self.h(), to_c_index(index)?, &mut lower, &mut upper) };
        self.raw.check_error()?;
        Ok(Bounds::new(lower, upper))
    }
}

impl ProblemBackend for NativeProblem {
    fn instance_name(&self) -> Result<String> {
        // SAFETY: valid handle.
        let name = unsafe { mp_instanceName(self.h()) };
        self.raw.take_name(name)
    }

    fn variable_count(&self) -> Result<usize> {
        // SAFETY: valid handle.
        self.raw.count(unsafe { mp_variables(self.h()) })
    }

    fn variable_name(&self, variable: usize) -> Result<String> {
        let name = unsafe { mp_variableName(self.h(), to_c_index(variable)?) };
        self.raw.take_name(name)
    }

    fn variable_type(&self, variable: usize) -> Result<VariableType> {
        let code = unsafe { mp_variableType(self.h(), to_c_index(variable)?) };
        self.raw.check_error()?;
        VariableType::from_code(code)
    }

    fn variable_bounds(&self, variable: usize) -> Result<Bounds> {
        self.bounds_via(variable, mp_variableBounds)
    }

    fn variable_presence(&self, variable: usize) -> Result<Presence> {
        let mut constraints = vec![0; self.constraint_count()? + 1];
        let mut objectives = vec![0; self.objective_count()? + 1];
        // SAFETY: buffers hold one count slot plus one slot per function.
        unsafe {
            mp_variablePresence(
                self.h(),
                to_c_index(variable)?,
                constraints.as_mut_ptr(),
                objectives.as_mut_ptr(),
            )
        };
        let c_len = constraints[0];
        let o_len = objectives[0];
        Ok(Presence {
            constraints: self.raw.index_list(constraints[1..].to_vec(), c_len)?,
            objectives: self.raw.index_list(objectives[1..].to_vec(), o_len)?,
        })
    }

    fn constraint_count(&self) -> Result<usize> {
        self.raw.count(unsafe { mp_constraints(self.h()) })
    }

    fn constraint_name(&self, constraint: usize) -> Result<String> {
        let name = unsafe { mp_constraintName(self.h(), to_c_index(constraint)?) };
        self.raw.take_name(name)
    }

    fn constraint_type(&self, constraint: usize) -> Result<ConstraintType> {
        let code = unsafe { mp_constraintType(self.h(), to_c_index(constraint)?) };
        self.raw.check_error()?;
        ConstraintType::from_code(code)
    }

    fn constraint_bounds(&self, constraint: usize) -> Result<Bounds> {
        self.bounds_via(constraint, mp_constraintBounds)
    }

    fn constraint_variables(&self, constraint: usize) -> Result<Vec<usize>> {
        let mut buffer = vec![0; self.variable_count()?];
        // SAFETY: buffer has room for every variable.
        let len = unsafe {
            mp_constraintVariables(self.h(), to_c_index(constraint)?, buffer.as_mut_ptr())
        };
        self.raw.index_list(buffer, len)
    }

    fn objective_count(&self) -> Result<usize> {
        self.raw.count(unsafe { mp_objectives(self.h()) })
    }

    fn objective_name(&self, objective: usize) -> Result<String> {
        let name = unsafe { mp_objectiveName(self.h(), to_c_index(objective)?) };
        self.raw.take_name(name)
    }

    fn objective_type(&self, objective: usize) -> Result<ObjectiveType> {
        let code = unsafe { mp_objectiveType(self.h(), to_c_index(objective)?) };
        self.raw.check_error()?;
        ObjectiveType::from_code(code)
    }

    fn objective_variables(&self, objective: usize) -> Result<Vec<usize>> {
        let mut buffer = vec![0; self.variable_count()?];
        // SAFETY: buffer has room for every variable.
        let len = unsafe {
            mp_objectiveVariables(self.h(), to_c_index(objective)?, buffer.as_mut_ptr())
        };
        self.raw.index_list(buffer, len)
    }

    fn function_shape(&self, kind: FunctionKind, index: usize) -> Result<FunctionShape> {
        let code = unsafe {
            mp_functionType(self.h(), c_int::from(kind.code()), to_c_index(index)?)
        };
        self.raw.check_error()?;
        FunctionShape::from_code(code)
    }

    fn create_analysis(&self) -> Result<Box<dyn AnalysisBackend>> {
        let variables = self.variable_count()?;
        // SAFETY: valid problem handle; the analysis keeps the problem alive.
        let handle = unsafe { mp_createAnalysis(self.h()) };
        if handle.is_null() {
            return Err(WorkshopError::Library(
                "Failed to create analysis handle".to_string(),
            ));
        }
        Ok(Box::new(NativeAnalysis {
            handle,
            variables,
            _problem: self.raw.clone(),
        }))
    }
}

/// Analysis handle created by the native library
pub struct NativeAnalysis {
    handle: MpHandle,
    variables: usize,
    _problem: Arc<RawProblem>,
}

// SAFETY: an analysis handle is only used by one thread at a time; it lives
// behind the mutex in `AnalysisState`.
unsafe impl Send for NativeAnalysis {}

impl Drop for NativeAnalysis {
    fn drop(&mut self) {
        // SAFETY: released exactly once, before the problem handle.
        unsafe { mp_releaseAnalysis(self.handle) };
    }
}

impl NativeAnalysis {
    fn check_variable(&self, variable: usize) -> Result<c_int> {
        if variable >= self.variables {
            return Err(WorkshopError::IndexOutOfRange {
                kind: "variable",
                index: variable,
                len: self.variables,
            });
        }
        to_c_index(variable)
    }

    fn hist_code(hist: HistType) -> c_int {
        c_int::from(hist.code())
    }
}

impl AnalysisBackend for NativeAnalysis {
    fn sample(&mut self, kind: FunctionKind, index: usize, extra_histograms: bool) -> Result<()> {
        // SAFETY: exclusive access through &mut self.
        unsafe {
            mp_aVariableBoundLineSample(
                self.handle,
                c_int::from(kind.code()),
                to_c_index(index)?,
                c_int::from(extra_histograms),
            )
        };
        Ok(())
    }

    fn bounds(&self, variable: usize) -> Result<Bounds> {
        let v = self.check_variable(variable)?;
        let (mut lower, mut upper) = (0.0, 0.0);
        unsafe { mp_aBounds(self.handle, v, &mut lower, &mut upper) };
        Ok(Bounds::new(lower, upper))
    }

    fn set_bounds(&mut self, variable: usize, bounds: Bounds) -> Result<()> {
        let v = self.check_variable(variable)?;
        unsafe { mp_aSetBounds(self.handle, v, bounds.lower, bounds.upper) };
        Ok(())
    }

    fn reset_bounds(&mut self) -> Result<()> {
        unsafe { mp_aResetBounds(self.handle) };
        Ok(())
    }

    fn settings(&self) -> Result<AnalysisSettings> {
        let (mut min, mut max) = (0.0, 0.0);
        // SAFETY: read-only getters on a valid handle.
        unsafe {
            mp_aLineLengthBounds(self.handle, &mut min, &mut max);
            Ok(AnalysisSettings {
                line_length_min: min,
                line_length_max: max,
                snap_discrete: mp_aSnapDiscreteComponents(self.handle) != 0,
                line_segments: mp_aNumLineSegments(self.handle),
                interior_line_points: mp_aInteriorLinePoints(self.handle),
                min_points_needed: mp_aMinimumPointsNeeded(self.handle),
                eval_error_tolerance: mp_aEvalErrorTolerance(self.handle),
                infinity: mp_aInfinity(self.handle),
                equality_tolerance: mp_aEqualityTolerance(self.handle),
                almost_equal_tolerance: mp_aAlmostEqualTolerance(self.handle),
            })
        }
    }

    fn apply_settings(&mut self, settings: &AnalysisSettings) -> Result<()> {
        settings.validate()?;
        // SAFETY: exclusive access through &mut self.
        unsafe {
            mp_aSetInfinity(self.handle, settings.infinity);
            mp_aSetLineLengthBounds(
                self.handle,
                settings.line_length_min,
                settings.line_length_max,
            );
            mp_aSetSnapDiscreteComponents(self.handle, c_int::from(settings.snap_discrete));
            mp_aSetNumLineSegments(self.handle, settings.line_segments);
            mp_aSetNumInteriorLinePoints(self.handle, settings.interior_line_points);
            mp_aSetMinimumPointsNeeded(self.handle, settings.min_points_needed);
            if mp_aSetEvalErrorTolerance(self.handle, settings.eval_error_tolerance) == 0 {
                return Err(WorkshopError::Validation(
                    "Evaluation error tolerance rejected".to_string(),
                ));
            }
            // widen almost-equal first so the pair never crosses
            let ok = if settings.equality_tolerance < mp_aEqualityTolerance(self.handle) {
                mp_aSetEqualityTolerance(self.handle, settings.equality_tolerance) != 0
                    && mp_aSetAlmostEqualTolerance(self.handle, settings.almost_equal_tolerance) != 0
            } else {
                mp_aSetAlmostEqualTolerance(self.handle, settings.almost_equal_tolerance) != 0
                    && mp_aSetEqualityTolerance(self.handle, settings.equality_tolerance) != 0
            };
            if !ok {
                return Err(WorkshopError::Validation(
                    "Equality tolerances rejected".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn empirical_shape(&self, kind: FunctionKind, index: usize) -> Result<Outcome<EmpiricalShape>> {
        let code = unsafe {
            mp_aGetEmpiricalShape(self.handle, to_c_index(index)?, c_int::from(kind.code()))
        };
        EmpiricalShape::from_code(i32::from(code))
    }

    fn region_effect(&self, constraint: usize) -> Result<Outcome<RegionEffect>> {
        let code = unsafe { mp_aGetRegionEffect(self.handle, to_c_index(constraint)?) };
        RegionEffect::from_code(i32::from(code))
    }

    fn optimum_effect(&self, objective: usize) -> Result<Outcome<OptimumEffect>> {
        let code = unsafe { mp_aGetOptimumEffect(self.handle, to_c_index(objective)?) };
        OptimumEffect::from_code(i32::from(code))
    }

    fn effectiveness(&self, constraint: usize) -> Result<Outcome<(f64, f64)>> {
        let (mut lower, mut upper) = (0.0, 0.0);
        let code = unsafe {
            mp_aEffectiveness(self.handle, to_c_index(constraint)?, &mut lower, &mut upper)
        };
        let status = ResultStatus::from_code(i32::from(code))?;
        Ok(Outcome::from_status(status, (lower, upper)))
    }

    fn extremum(&self, objective: usize) -> Result<Outcome<f64>> {
        let mut value = 0.0;
        let code = unsafe { mp_aExtremum(self.handle, to_c_index(objective)?, &mut value) };
        let status = ResultStatus::from_code(i32::from(code))?;
        Ok(Outcome::from_status(status, value))
    }

    fn extremum_point(&self, objective: usize) -> Result<Outcome<Vec<f64>>> {
        let mut point = vec![f64::NAN; self.variables];
        // SAFETY: the point buffer has one slot per variable.
        let code = unsafe {
            mp_aExtremumPoint(self.handle, to_c_index(objective)?, point.as_mut_ptr())
        };
        let status = ResultStatus::from_code(i32::from(code))?;
        Ok(Outcome::from_status(status, point))
    }

    fn histogram(&self, hist: HistType) -> Result<HistogramStats> {
        let h = Self::hist_code(hist);
        // SAFETY: read-only getters on a valid handle.
        unsafe {
            let num_bins = mp_aGetHistogramNumBins(self.handle, h);
            let bins = (0..num_bins)
                .map(|b| c_int::try_from(b).map(|b| mp_aGetHistogramBin(self.handle, h, b)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| WorkshopError::Library(format!("{} bins reported", num_bins)))?;
            Ok(HistogramStats {
                bins,
                below_range: mp_aGetHistogramNumBelowRange(self.handle, h),
                above_range: mp_aGetHistogramNumAboveRange(self.handle, h),
                data_points: mp_aGetHistogramDataPoints(self.handle, h),
                mean: mp_aGetHistogramMean(self.handle, h),
                std_dev: mp_aGetHistogramStdDev(self.handle, h),
                variance: mp_aGetHistogramVariance(self.handle, h),
                population_variance: mp_aGetHistogramPopVariance(self.handle, h),
                minimum: mp_aGetHistogramMinimum(self.handle, h),
                maximum: mp_aGetHistogramMaximum(self.handle, h),
            })
        }
    }

    fn set_histogram_bins(&mut self, hist: HistType, layout: &BinLayout) -> Result<()> {
        layout.validate()?;
        let mut bounds = layout.upper_bounds.clone();
        let count = to_c_index(bounds.len())?;
        // SAFETY: the library sorts the bounds in place within `count` entries.
        unsafe {
            mp_aSetHistogramBins(
                self.handle,
                Self::hist_code(hist),
                count,
                layout.first_width,
                bounds.as_mut_ptr(),
            )
        };
        Ok(())
    }
}
