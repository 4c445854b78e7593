//! Embedded Python programs
//!
//! Each script is run with `python -c` and reads its arguments from
//! `sys.argv[1:]`. Scripts report failure by raising, so the last stderr
//! line carries the exception text.

/// Managed export through optimum's `ORTModel` classes.
///
/// argv: checkpoint, out_dir, family
pub const MANAGED_EXPORT: &str = r#"
import sys
checkpoint, out_dir, family = sys.argv[1], sys.argv[2], sys.argv[3]
if family == "generative":
    from optimum.onnxruntime import ORTModelForCausalLM as Model
else:
    from optimum.onnxruntime import ORTModelForFeatureExtraction as Model
model = Model.from_pretrained(checkpoint, export=True)
model.save_pretrained(out_dir)
"#;

/// Raw `torch.onnx.export` at an explicit opset.
///
/// argv: checkpoint, out_dir, family, opset
pub const RAW_EXPORT: &str = r#"
import sys
from pathlib import Path
import torch
from transformers import AutoTokenizer
checkpoint, out_dir, family, opset = sys.argv[1], sys.argv[2], sys.argv[3], int(sys.argv[4])
if family == "generative":
    from transformers import AutoModelForCausalLM as Auto
    output_names = ["logits"]
else:
    from transformers import AutoModel as Auto
    output_names = ["last_hidden_state"]
tokenizer = AutoTokenizer.from_pretrained(checkpoint)
model = Auto.from_pretrained(checkpoint)
model.eval()
encoded = tokenizer("This is a sample sentence", padding=True, truncation=True,
                    max_length=512, return_tensors="pt")
axes = {0: "batch", 1: "sequence"}
Path(out_dir).mkdir(parents=True, exist_ok=True)
with torch.no_grad():
    torch.onnx.export(
        model,
        (encoded["input_ids"], encoded["attention_mask"]),
        str(Path(out_dir) / "model.onnx"),
        input_names=["input_ids", "attention_mask"],
        output_names=output_names,
        dynamic_axes={"input_ids": axes, "attention_mask": axes, output_names[0]: axes},
        opset_version=opset,
        do_constant_folding=True,
    )
"#;

/// Load a graph with its external data and save it with every tensor inline.
///
/// argv: graph, target
pub const INLINE: &str = r#"
import sys
import onnx
graph, target = sys.argv[1], sys.argv[2]
model = onnx.load(graph, load_external_data=True)
onnx.save_model(model, target, save_as_external_data=False)
"#;

/// Create an inference session with optimizations disabled and print its
/// signatures as JSON on stdout.
///
/// argv: graph
pub const RUNTIME_LOAD: &str = r#"
import sys, json
import onnxruntime as ort
options = ort.SessionOptions()
options.graph_optimization_level = ort.GraphOptimizationLevel.ORT_DISABLE_ALL
session = ort.InferenceSession(sys.argv[1], sess_options=options,
                               providers=["CPUExecutionProvider"])
def describe(args):
    return [{"name": a.name, "shape": list(a.shape), "element_type": a.type} for a in args]
print(json.dumps({"inputs": describe(session.get_inputs()),
                  "outputs": describe(session.get_outputs())}))
"#;

/// Print the version of an importable module.
///
/// argv: module
pub const PROBE_MODULE: &str = r#"
import sys, importlib
module = importlib.import_module(sys.argv[1])
print(getattr(module, "__version__", "unknown"))
"#;
